//! Collectors command implementation.
//!
//! Lists registered collectors with their default and effective state.

use gpfs_exporter::registry::flag_name;
use gpfs_exporter::CollectorRegistry;

fn state(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Prints every registered collector.
pub fn command_collectors(registry: &CollectorRegistry) -> Result<(), Box<dyn std::error::Error>> {
    println!("📋 Registered Collectors");
    println!("========================\n");
    println!("{:15} {:10} {:10} Flag", "Collector", "State", "Default");

    for entry in registry.entries() {
        println!(
            "{:15} {:10} {:10} --{}",
            entry.name(),
            state(entry.enabled()),
            state(entry.default_enabled()),
            flag_name(entry.name())
        );
    }
    Ok(())
}
