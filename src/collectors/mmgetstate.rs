//! GPFS daemon state collector.
//!
//! Runs `mmgetstate -Y` and exposes the local node state as a one-hot
//! `gpfs_state{state}` gauge.

use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::sync::Arc;

use crate::collector::{descs_of, Collector, CollectorContext, NAMESPACE};
use crate::error::{CollectError, RegistryError};
use crate::parse::parse_mmgetstate;
use crate::registry::CollectorRegistry;
use crate::runner::CommandRunner;

pub const NAME: &str = "mmgetstate";

/// States reported individually; anything else is folded into `unknown`.
pub const STATES: [&str; 4] = ["active", "arbitrating", "down", "unknown"];

pub fn register(registry: &mut CollectorRegistry) -> Result<(), RegistryError> {
    registry.register(NAME, true, |ctx| {
        Ok(Box::new(MmgetstateCollector::new(ctx)?) as Box<dyn Collector>)
    })
}

pub struct MmgetstateCollector {
    runner: Arc<dyn CommandRunner>,
    mmgetstate: String,
    state: GaugeVec,
}

impl MmgetstateCollector {
    pub fn new(ctx: &CollectorContext) -> Result<Self, CollectError> {
        let state = GaugeVec::new(
            Opts::new("state", "GPFS state").namespace(NAMESPACE),
            &["state"],
        )?;
        Ok(Self {
            runner: ctx.runner.clone(),
            mmgetstate: ctx.binary("mmgetstate"),
            state,
        })
    }
}

impl Collector for MmgetstateCollector {
    fn describe(&self) -> Vec<Desc> {
        descs_of(&self.state)
    }

    fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        let out = self.runner.run(&self.mmgetstate, &["-Y"])?;
        let record = parse_mmgetstate(&out)?;

        let current = if STATES.contains(&record.status.as_str()) {
            record.status.as_str()
        } else {
            "unknown"
        };
        for state in STATES {
            self.state
                .with_label_values(&[state])
                .set(if state == current { 1.0 } else { 0.0 });
        }
        Ok(self.state.collect())
    }
}
