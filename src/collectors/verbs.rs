//! Verbs RDMA status collector.
//!
//! Runs `mmfsadm test verbs status` and exposes whether verbs RDMA is started.

use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Opts};
use std::sync::Arc;

use crate::collector::{descs_of, Collector, CollectorContext, NAMESPACE};
use crate::error::{CollectError, ParseError, RegistryError};
use crate::parse::{StatusPattern, StatusRecord};
use crate::registry::CollectorRegistry;
use crate::runner::CommandRunner;

pub const NAME: &str = "verbs";

const LABEL: &str = "VERBS RDMA";

pub fn register(registry: &mut CollectorRegistry) -> Result<(), RegistryError> {
    registry.register(NAME, false, |ctx| {
        Ok(Box::new(VerbsCollector::new(ctx)?) as Box<dyn Collector>)
    })
}

pub struct VerbsCollector {
    runner: Arc<dyn CommandRunner>,
    mmfsadm: String,
    pattern: StatusPattern,
    status: Gauge,
}

impl VerbsCollector {
    pub fn new(ctx: &CollectorContext) -> Result<Self, CollectError> {
        let status = Gauge::with_opts(
            Opts::new("status", "GPFS verbs status, 1=started 0=not started")
                .namespace(NAMESPACE)
                .subsystem("verbs"),
        )?;
        Ok(Self {
            runner: ctx.runner.clone(),
            mmfsadm: ctx.binary("mmfsadm"),
            pattern: StatusPattern::new(LABEL)?,
            status,
        })
    }

    fn verbs(&self) -> Result<StatusRecord, CollectError> {
        let out = self
            .runner
            .run(&self.mmfsadm, &["test", "verbs", "status"])?;
        Ok(self.pattern.parse(&out)?)
    }
}

impl Collector for VerbsCollector {
    fn describe(&self) -> Vec<Desc> {
        descs_of(&self.status)
    }

    fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        let record = self.verbs()?;
        self.status
            .set(if record.status == "started" { 1.0 } else { 0.0 });
        Ok(self.status.collect())
    }
}

/// Extracts the value of the `VERBS RDMA status:` line.
pub fn parse_verbs(out: &str) -> Result<StatusRecord, ParseError> {
    StatusPattern::new(LABEL)?.parse(out)
}
