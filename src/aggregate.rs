//! The aggregate collector registered with the Prometheus registry.
//!
//! [`GpfsCollector`] owns one instance of every collector enabled at build
//! time. Each scrape runs them one after another under a single mutex, so
//! two scrapes never run external commands at the same time, and emits the
//! `gpfs_exporter_{collector_duration_seconds,collect_error,last_execution}`
//! triad for each collector whether or not it succeeded.

use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tracing::{debug, error};

use crate::collector::{descs_of, Collector, CollectorContext, NAMESPACE};
use crate::error::RegistryError;
use crate::registry::CollectorRegistry;

const SUBSYSTEM: &str = "exporter";

/// Outcome of the most recent pass of one collector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectorSummary {
    pub duration_seconds: f64,
    /// Unix seconds.
    pub last_execution: i64,
    pub error: Option<String>,
}

/// Read handle on the latest per-collector outcomes, used by `/health`.
#[derive(Debug, Clone, Default)]
pub struct ScrapeStatus {
    inner: Arc<RwLock<BTreeMap<String, Option<CollectorSummary>>>>,
}

impl ScrapeStatus {
    /// Enabled collectors in name order; `None` until the first scrape.
    pub fn snapshot(&self) -> Vec<(String, Option<CollectorSummary>)> {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn record(&self, name: &str, summary: CollectorSummary) {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        guard.insert(name.to_string(), Some(summary));
    }
}

pub struct GpfsCollector {
    collectors: Mutex<BTreeMap<String, Box<dyn Collector>>>,
    descs: Vec<Desc>,
    duration: GaugeVec,
    collect_error: GaugeVec,
    last_execution: GaugeVec,
    status: ScrapeStatus,
}

impl GpfsCollector {
    /// Instantiates every enabled collector in `registry`.
    ///
    /// Fails if any factory fails; nothing is kept in that case.
    pub fn build(
        registry: &CollectorRegistry,
        ctx: &CollectorContext,
    ) -> Result<Self, RegistryError> {
        let mut collectors = BTreeMap::new();
        for entry in registry.entries().filter(|e| e.enabled()) {
            let collector = entry
                .instantiate(ctx)
                .map_err(|source| RegistryError::Factory {
                    name: entry.name().to_string(),
                    source,
                })?;
            debug!("Collector {} enabled", entry.name());
            collectors.insert(entry.name().to_string(), collector);
        }
        Self::from_collectors(collectors)
    }

    /// Wraps already constructed collectors keyed by name.
    pub fn from_collectors(
        collectors: BTreeMap<String, Box<dyn Collector>>,
    ) -> Result<Self, RegistryError> {
        let duration = bookkeeping_gauge("collector_duration_seconds", "Collector time duration.")
            .map_err(metrics_error)?;
        let collect_error = bookkeeping_gauge(
            "collect_error",
            "Indicates if error has occurred during collection",
        )
        .map_err(metrics_error)?;
        let last_execution = bookkeeping_gauge(
            "last_execution",
            "Last execution time of the collector in Unix seconds",
        )
        .map_err(metrics_error)?;

        let mut descs = descs_of(&duration);
        descs.extend(descs_of(&collect_error));
        descs.extend(descs_of(&last_execution));
        for collector in collectors.values() {
            descs.extend(collector.describe());
        }

        let status = ScrapeStatus::default();
        {
            let mut guard = status.inner.write().unwrap_or_else(|p| p.into_inner());
            for name in collectors.keys() {
                guard.insert(name.clone(), None);
            }
        }

        Ok(Self {
            collectors: Mutex::new(collectors),
            descs,
            duration,
            collect_error,
            last_execution,
            status,
        })
    }

    /// Names of the owned collectors, in collection order.
    pub fn names(&self) -> Vec<String> {
        self.status.snapshot().into_iter().map(|(k, _)| k).collect()
    }

    pub fn status(&self) -> ScrapeStatus {
        self.status.clone()
    }
}

impl PromCollector for GpfsCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut collectors = self.collectors.lock().unwrap_or_else(|p| p.into_inner());
        let mut families = Vec::new();

        for (name, collector) in collectors.iter_mut() {
            let start = Instant::now();
            let result = collector.collect();
            let elapsed = start.elapsed().as_secs_f64();
            let now = chrono::Utc::now().timestamp();

            self.last_execution
                .with_label_values(&[name.as_str()])
                .set(now as f64);
            self.duration
                .with_label_values(&[name.as_str()])
                .set(elapsed);

            let error = match result {
                Ok(mut collected) => {
                    debug!("Collector {} succeeded in {:.3}s", name, elapsed);
                    families.append(&mut collected);
                    None
                }
                Err(e) => {
                    error!("Collector {} failed after {:.3}s: {}", name, elapsed, e);
                    Some(e.to_string())
                }
            };

            self.collect_error
                .with_label_values(&[name.as_str()])
                .set(if error.is_some() { 1.0 } else { 0.0 });

            self.status.record(
                name,
                CollectorSummary {
                    duration_seconds: elapsed,
                    last_execution: now,
                    error,
                },
            );
        }

        let mut out = self.duration.collect();
        out.extend(self.collect_error.collect());
        out.extend(self.last_execution.collect());
        out.extend(families);
        out
    }
}

fn bookkeeping_gauge(name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(
        Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        &["collector"],
    )
}

fn metrics_error(e: prometheus::Error) -> RegistryError {
    RegistryError::Factory {
        name: SUBSYSTEM.to_string(),
        source: e.into(),
    }
}
