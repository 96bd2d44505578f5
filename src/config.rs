//! Configuration management for gpfs-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use gpfs_exporter::collector::{DEFAULT_MMFS_BIN_DIR, DEFAULT_PROC_MOUNTS};
use gpfs_exporter::collectors::mount::parse_mount_list;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9303;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Command execution
    #[serde(alias = "mmfs-bin-dir")]
    pub mmfs_bin_dir: Option<PathBuf>,
    #[serde(alias = "use-sudo")]
    pub use_sudo: Option<bool>,

    // Mount collector
    #[serde(alias = "proc-mounts")]
    pub proc_mounts: Option<PathBuf>,
    pub mounts: Option<Vec<String>>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// Collector name -> enabled. Unlisted collectors keep their default.
    /// Must stay the last field: TOML emits tables after plain values.
    #[serde(default)]
    pub collectors: BTreeMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            mmfs_bin_dir: Some(PathBuf::from(DEFAULT_MMFS_BIN_DIR)),
            use_sudo: Some(true),
            proc_mounts: Some(PathBuf::from(DEFAULT_PROC_MOUNTS)),
            mounts: None,
            enable_health: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            collectors: BTreeMap::new(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(
    cfg: &Config,
    known_collectors: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(name) = cfg
        .collectors
        .keys()
        .find(|name| !known_collectors.contains(&name.as_str()))
    {
        return Err(format!(
            "Unknown collector '{}' in configuration, expected one of: {}",
            name,
            known_collectors.join(", ")
        )
        .into());
    }

    effective_log_level(cfg)?;

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Log level from the merged configuration; unset means info.
pub fn effective_log_level(cfg: &Config) -> Result<LogLevel, Box<dyn std::error::Error>> {
    match cfg.log_level.as_deref() {
        None => Ok(LogLevel::Info),
        Some(name) => LogLevel::from_str(name, true).map_err(|_| {
            format!(
                "Invalid log_level '{}', expected one of: off, error, warn, info, debug, trace",
                name
            )
            .into()
        }),
    }
}

fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = &args.log_level {
        config.log_level = level
            .to_possible_value()
            .map(|v| v.get_name().to_string());
    }

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(dir) = &args.mmfs_bin_dir {
        config.mmfs_bin_dir = Some(dir.clone());
    }
    if args.no_sudo {
        config.use_sudo = Some(false);
    }
    if let Some(path) = &args.proc_mounts {
        config.proc_mounts = Some(path.clone());
    }
    if let Some(list) = &args.mounts {
        config.mounts = Some(parse_mount_list(list));
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file; without an explicit path the default locations are
/// tried and built-in defaults are used when none exists.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/gpfs-exporter/gpfs-exporter.yaml",
                "/etc/gpfs-exporter/gpfs-exporter.yml",
                "/etc/gpfs-exporter/gpfs-exporter.json",
                "./gpfs-exporter.yaml",
                "./gpfs-exporter.yml",
                "./gpfs-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
    let config = parse_config(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content, choosing the format from the file extension.
fn parse_config(content: &str, path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        // Default to YAML
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::Builder;

    const KNOWN: &[&str] = &["mmgetstate", "mount", "verbs"];

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default(), KNOWN).is_ok());
    }

    #[test]
    fn test_unknown_collector_rejected() {
        let mut cfg = Config::default();
        cfg.collectors.insert("bogus".into(), true);
        let err = validate_effective_config(&cfg, KNOWN).unwrap_err();
        assert!(err.to_string().contains("Unknown collector 'bogus'"));
    }

    #[test]
    fn test_tls_requires_paths() {
        let cfg = Config {
            enable_tls: Some(true),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg, KNOWN).unwrap_err();
        assert!(err
            .to_string()
            .contains("TLS is enabled but neither tls_cert_path nor tls_key_path are set"));
    }

    #[test]
    fn test_load_yaml_config() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "port: 9999\nmmfs-bin-dir: /opt/mmfs/bin\nuse_sudo: false\ncollectors:\n  verbs: true\n  mount: false\n"
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.port, Some(9999));
        assert_eq!(cfg.mmfs_bin_dir, Some(PathBuf::from("/opt/mmfs/bin")));
        assert_eq!(cfg.use_sudo, Some(false));
        assert_eq!(cfg.collectors.get("verbs"), Some(&true));
        assert_eq!(cfg.collectors.get("mount"), Some(&false));
    }

    #[test]
    fn test_log_level_from_config() {
        let cfg = Config {
            log_level: Some("DEBUG".into()),
            ..Config::default()
        };
        assert!(matches!(effective_log_level(&cfg).unwrap(), LogLevel::Debug));

        let unset = Config {
            log_level: None,
            ..Config::default()
        };
        assert!(matches!(effective_log_level(&unset).unwrap(), LogLevel::Info));

        let bad = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&bad, KNOWN).unwrap_err();
        assert!(err.to_string().contains("Invalid log_level 'loud'"));
    }

    #[test]
    fn test_cli_log_level_overrides_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "log_level: debug").unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::try_parse_from(["gpfs-exporter", "--config", path]).unwrap();
        let cfg = resolve_config(&args).unwrap();
        assert!(matches!(effective_log_level(&cfg).unwrap(), LogLevel::Debug));

        let args =
            Args::try_parse_from(["gpfs-exporter", "--config", path, "--log-level", "warn"])
                .unwrap();
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_json_config() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"port": 9100, "mounts": ["/fs/a"]}}"#).unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.port, Some(9100));
        assert_eq!(cfg.mounts, Some(vec!["/fs/a".to_string()]));
        assert!(cfg.collectors.is_empty());
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/gpfs-exporter.yaml"))).is_err());
    }

    #[test]
    fn test_render_round_trips_through_yaml() {
        let rendered = render_config(&Config::default(), ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed.port, Some(DEFAULT_PORT));
        assert_eq!(parsed.use_sudo, Some(true));
    }
}
