//! Collectors for GPFS administrative data sources.
//!
//! Each module registers itself with a [`CollectorRegistry`] under a unique
//! name and a default enabled state.

pub mod mmgetstate;
pub mod mount;
pub mod verbs;

use crate::error::RegistryError;
use crate::registry::CollectorRegistry;

/// Registers every built-in collector.
pub fn register_all(registry: &mut CollectorRegistry) -> Result<(), RegistryError> {
    mmgetstate::register(registry)?;
    mount::register(registry)?;
    verbs::register(registry)?;
    Ok(())
}

/// A registry populated with every built-in collector.
pub fn default_registry() -> Result<CollectorRegistry, RegistryError> {
    let mut registry = CollectorRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
