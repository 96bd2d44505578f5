//! Check command implementation.
//!
//! Validates system requirements and configuration.

use gpfs_exporter::CollectorRegistry;
use std::path::Path;

use crate::config::Config;
use crate::startup_checks::{required_binaries, validate_requirements};

/// Validates that the enabled collectors can run on this host.
pub fn command_check(
    config: &Config,
    registry: &CollectorRegistry,
    bin_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 GPFS Exporter - System Check");
    println!("===============================");

    let mounts_configured = config.mounts.as_ref().is_some_and(|m| !m.is_empty());
    let mut binaries: Vec<&str> = registry
        .entries()
        .filter(|e| e.enabled())
        .flat_map(|e| required_binaries(e.name(), mounts_configured).iter().copied())
        .collect();
    binaries.sort_unstable();
    binaries.dedup();

    println!("\n📁 Binary directory: {}", bin_dir.display());
    for binary in &binaries {
        let path = bin_dir.join(binary);
        if path.is_file() {
            println!("   ✅ {}", path.display());
        } else {
            println!("   ❌ {} not found", path.display());
        }
    }

    if let Some(mounts) = &config.proc_mounts {
        if mounts.exists() {
            println!("\n📄 Mount table {} readable", mounts.display());
        } else {
            println!("\n❌ Mount table {} not found", mounts.display());
        }
    }

    match validate_requirements(bin_dir, config.use_sudo.unwrap_or(true), &binaries) {
        Ok(()) => {
            println!("\n✅ All checks passed");
            Ok(())
        }
        Err(e) => {
            println!("\n❌ Some checks failed: {}", e);
            std::process::exit(1);
        }
    }
}
