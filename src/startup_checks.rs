//! Startup requirement validation for gpfs-exporter.
//!
//! This module checks that the GPFS administrative binaries the enabled
//! collectors need are present and that the exporter can run them.

use nix::unistd::geteuid;
use std::path::Path;
use tracing::{error, info, warn};

/// Binaries required by each collector.
pub fn required_binaries(collector: &str, mounts_configured: bool) -> &'static [&'static str] {
    match collector {
        "mmgetstate" => &["mmgetstate"],
        "mount" if mounts_configured => &[],
        "mount" => &["mmlsfs"],
        "verbs" => &["mmfsadm"],
        _ => &[],
    }
}

/// Validate all runtime requirements
pub fn validate_requirements(
    bin_dir: &Path,
    use_sudo: bool,
    binaries: &[&str],
) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges(use_sudo)?;
    check_binaries(bin_dir, binaries)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check that commands can run with the privileges GPFS requires
fn check_user_privileges(use_sudo: bool) -> Result<(), ValidationError> {
    if geteuid().is_root() {
        info!("✅ Running as root (uid=0)");
        return Ok(());
    }

    if !use_sudo {
        warn!("⚠️  Not running as root and sudo is disabled - GPFS commands will likely fail");
        return Ok(());
    }

    if file_exists(Path::new("/usr/bin/sudo")) || file_exists(Path::new("/bin/sudo")) {
        info!("✅ Commands will run through sudo");
        Ok(())
    } else {
        error!("❌ sudo not found but use_sudo is enabled");
        error!("   Solutions:");
        error!("   1. Install sudo and allow the exporter user to run the mm* commands");
        error!("   2. Run as root with --no-sudo");
        Err(ValidationError::SudoMissing)
    }
}

/// Check that every required mm* binary exists
fn check_binaries(bin_dir: &Path, binaries: &[&str]) -> Result<(), ValidationError> {
    let missing: Vec<String> = binaries
        .iter()
        .map(|b| bin_dir.join(b))
        .filter(|p| !file_exists(p))
        .map(|p| p.display().to_string())
        .collect();

    if missing.is_empty() {
        info!("✅ GPFS binaries found in {}", bin_dir.display());
        return Ok(());
    }

    for path in &missing {
        error!("❌ {} not found", path);
    }
    Err(ValidationError::MissingBinaries(missing.join(", ")))
}

fn file_exists(path: &Path) -> bool {
    path.metadata().map(|m| !m.is_dir()).unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("sudo is enabled but not installed")]
    SudoMissing,

    #[error("GPFS binaries not found: {0}")]
    MissingBinaries(String),
}
