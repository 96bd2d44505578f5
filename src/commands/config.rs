//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("gpfs-exporter.yaml"));

    let is_yaml = matches!(format, ConfigFormat::Yaml);
    let mut content = render_config(&config, format)?;
    if commented && is_yaml {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# GPFS Exporter Configuration
# ============================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"                   # Bind IP (0.0.0.0 = all interfaces)
# port: 9303                        # HTTP port
#
# Command Execution
# -----------------
# mmfs_bin_dir: /usr/lpp/mmfs/bin   # Directory holding mmgetstate, mmlsfs, mmfsadm
# use_sudo: true                    # Prefix every command with sudo
#
# Mount Collector
# ---------------
# proc_mounts: /proc/mounts         # Mount table to check
# mounts: null                      # Mountpoints to check (null = ask mmlsfs)
#
# Collectors
# ----------
# collectors:                       # Override default enabled state per collector
#   verbs: true
#   mount: false
#
# Feature Flags
# -------------
# enable_health: true               # Serve /health
# log_level: info                  # off|error|warn|info|debug|trace (--log-level wins)
#
# TLS
# ---
# enable_tls: false
# tls_cert_path: null
# tls_key_path: null

"#;
    format!("{}{}", comments, yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_config_is_still_valid_yaml() {
        let yaml = render_config(&Config::default(), ConfigFormat::Yaml).unwrap();
        let commented = add_config_comments(yaml);
        let parsed: Config = serde_yaml::from_str(&commented).unwrap();
        assert_eq!(parsed.use_sudo, Some(true));
    }
}
