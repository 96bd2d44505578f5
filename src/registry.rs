//! Table of known collectors and their enabled state.
//!
//! Collector modules register themselves once at startup. Configuration
//! (config file, then `--collector.<name>` / `--no-collector.<name>` flags)
//! may flip the enabled flags, after which the registry is only read by
//! [`GpfsCollector::build`](crate::aggregate::GpfsCollector::build).

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use tracing::debug;

use crate::collector::{Collector, CollectorContext};
use crate::error::{CollectError, RegistryError};

/// Constructs a collector from the shared context.
pub type Factory =
    Box<dyn Fn(&CollectorContext) -> Result<Box<dyn Collector>, CollectError> + Send + Sync>;

/// A registered collector.
pub struct Entry {
    name: String,
    default_enabled: bool,
    enabled: bool,
    factory: Factory,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn instantiate(
        &self,
        ctx: &CollectorContext,
    ) -> Result<Box<dyn Collector>, CollectError> {
        (self.factory)(ctx)
    }
}

#[derive(Default)]
pub struct CollectorRegistry {
    entries: BTreeMap<String, Entry>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector. Registering the same name twice is an error.
    pub fn register<F>(
        &mut self,
        name: &str,
        default_enabled: bool,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&CollectorContext) -> Result<Box<dyn Collector>, CollectError>
            + Send
            + Sync
            + 'static,
    {
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        debug!(
            "Registered collector {} (default: {})",
            name,
            default_state(default_enabled)
        );
        self.entries.insert(
            name.to_string(),
            Entry {
                name: name.to_string(),
                default_enabled,
                enabled: default_enabled,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|e| e.enabled)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Applies the `collectors` map from the config file.
    pub fn apply_config(&mut self, states: &BTreeMap<String, bool>) -> Result<(), RegistryError> {
        for (name, enabled) in states {
            self.set_enabled(name, *enabled)?;
        }
        Ok(())
    }

    /// Adds one `--collector.<name>` and one `--no-collector.<name>` switch
    /// per registered collector.
    pub fn augment_args(&self, mut cmd: Command) -> Command {
        for entry in self.entries.values() {
            let on = flag_name(&entry.name);
            let off = negated_flag_name(&entry.name);
            cmd = cmd
                .arg(
                    Arg::new(on.clone())
                        .long(on.clone())
                        .action(ArgAction::SetTrue)
                        .overrides_with(off.clone())
                        .help(flag_help(&entry.name, entry.default_enabled)),
                )
                .arg(
                    Arg::new(off.clone())
                        .long(off.clone())
                        .action(ArgAction::SetTrue)
                        .overrides_with(on)
                        .help(format!("Disable the {} collector.", entry.name)),
                );
        }
        cmd
    }

    /// Applies switches parsed from a command built by [`Self::augment_args`].
    pub fn apply_matches(&mut self, matches: &ArgMatches) {
        for entry in self.entries.values_mut() {
            let on = flag_name(&entry.name);
            let off = negated_flag_name(&entry.name);
            if matches.try_get_one::<bool>(&on).ok().flatten() == Some(&true) {
                entry.enabled = true;
            }
            if matches.try_get_one::<bool>(&off).ok().flatten() == Some(&true) {
                entry.enabled = false;
            }
        }
    }
}

/// Name of the switch that enables `collector`.
pub fn flag_name(collector: &str) -> String {
    format!("collector.{}", collector)
}

fn negated_flag_name(collector: &str) -> String {
    format!("no-collector.{}", collector)
}

pub fn flag_help(collector: &str, default_enabled: bool) -> String {
    format!(
        "Enable the {} collector (default: {}).",
        collector,
        default_state(default_enabled)
    )
}

fn default_state(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
