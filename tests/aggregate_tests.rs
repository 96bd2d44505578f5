//! Integration tests for the aggregate collector.
//!
//! These tests drive collectors through a real Prometheus registry and
//! check the bookkeeping metrics and scrape serialization.

use gpfs_exporter::runner::StaticRunner;
use gpfs_exporter::{
    CollectError, Collector, CollectorContext, CollectorRegistry, GpfsCollector, ParseError,
};
use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MMGETSTATE: &str = "\
mmgetstate::HEADER:version:reserved:reserved:nodeName:nodeNumber:state:quorum:nodesUp:totalNodes:remarks:cnfsState:
mmgetstate::0:1:::nsd01:1:active:1:2:2:::
";

/// Reports a constant gauge, or fails when `fail` is set.
struct Constant {
    gauge: Gauge,
    fail: bool,
}

impl Constant {
    fn new(name: &str, fail: bool) -> Self {
        let gauge = Gauge::with_opts(Opts::new(name, "test gauge")).unwrap();
        gauge.set(42.0);
        Self { gauge, fail }
    }
}

impl Collector for Constant {
    fn describe(&self) -> Vec<Desc> {
        self.gauge.desc().into_iter().cloned().collect()
    }

    fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        if self.fail {
            return Err(ParseError::NoData("constant").into());
        }
        Ok(self.gauge.collect())
    }
}

fn exposition(registry: &Registry) -> String {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .unwrap();
    String::from_utf8(buf).unwrap()
}

fn context() -> CollectorContext {
    CollectorContext::new(Arc::new(StaticRunner::new()))
}

#[test]
fn test_only_enabled_collectors_run() {
    let mut registry = CollectorRegistry::new();
    registry
        .register("alpha", true, |_| {
            Ok(Box::new(Constant::new("alpha_value", false)) as Box<dyn Collector>)
        })
        .unwrap();
    registry
        .register("beta", false, |_| {
            Ok(Box::new(Constant::new("beta_value", false)) as Box<dyn Collector>)
        })
        .unwrap();

    let collector = GpfsCollector::build(&registry, &context()).unwrap();
    assert_eq!(collector.names(), vec!["alpha".to_string()]);

    let prom = Registry::new();
    prom.register(Box::new(collector)).unwrap();
    let text = exposition(&prom);

    assert!(text.contains("alpha_value 42"));
    assert!(text.contains("gpfs_exporter_collect_error{collector=\"alpha\"} 0"));
    assert!(text.contains("gpfs_exporter_collector_duration_seconds{collector=\"alpha\"}"));
    assert!(text.contains("gpfs_exporter_last_execution{collector=\"alpha\"}"));
    assert!(!text.contains("beta"));
}

#[test]
fn test_failed_collector_keeps_bookkeeping() {
    let mut registry = CollectorRegistry::new();
    registry
        .register("good", true, |_| {
            Ok(Box::new(Constant::new("good_value", false)) as Box<dyn Collector>)
        })
        .unwrap();
    registry
        .register("bad", true, |_| {
            Ok(Box::new(Constant::new("bad_value", true)) as Box<dyn Collector>)
        })
        .unwrap();

    let collector = GpfsCollector::build(&registry, &context()).unwrap();
    let status = collector.status();
    let prom = Registry::new();
    prom.register(Box::new(collector)).unwrap();
    let text = exposition(&prom);

    assert!(text.contains("good_value 42"));
    assert!(!text.contains("bad_value 42"));
    assert!(text.contains("gpfs_exporter_collect_error{collector=\"bad\"} 1"));
    assert!(text.contains("gpfs_exporter_collect_error{collector=\"good\"} 0"));

    let snapshot = status.snapshot();
    assert_eq!(snapshot.len(), 2);
    let bad = snapshot[0].1.as_ref().unwrap();
    assert_eq!(snapshot[0].0, "bad");
    assert!(bad.error.is_some());
    assert!(bad.last_execution > 0);
    assert!(snapshot[1].1.as_ref().unwrap().error.is_none());
}

#[test]
fn test_factory_failure_aborts_build() {
    let mut registry = CollectorRegistry::new();
    registry
        .register("broken", true, |_| Err(ParseError::NoData("factory").into()))
        .unwrap();

    match GpfsCollector::build(&registry, &context()) {
        Err(gpfs_exporter::RegistryError::Factory { name, .. }) => assert_eq!(name, "broken"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn test_concurrent_scrapes_are_serialized() {
    let runner = Arc::new(
        StaticRunner::new()
            .stdout("mmgetstate", MMGETSTATE)
            .with_delay(Duration::from_millis(20)),
    );

    let mut registry = gpfs_exporter::collectors::default_registry().unwrap();
    registry.set_enabled("mount", false).unwrap();
    let ctx = CollectorContext::new(runner.clone());
    let collector = GpfsCollector::build(&registry, &ctx).unwrap();

    let prom = Arc::new(Registry::new());
    prom.register(Box::new(collector)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let prom = Arc::clone(&prom);
            thread::spawn(move || exposition(&prom))
        })
        .collect();

    for handle in handles {
        let text = handle.join().unwrap();
        assert!(text.contains("gpfs_state{state=\"active\"} 1"));
    }

    assert_eq!(runner.calls().len(), 4);
    assert_eq!(runner.max_in_flight(), 1);
}

#[test]
fn test_builtin_collectors_with_canned_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let proc_mounts = dir.path().join("mounts");
    std::fs::write(
        &proc_mounts,
        "proc /proc proc rw 0 0\nfs1 /gpfs/fs1 gpfs rw 0 0\n",
    )
    .unwrap();

    let runner = StaticRunner::new()
        .stdout("mmgetstate", MMGETSTATE)
        .stdout("mmfsadm", "VERBS RDMA status: started\n");

    let mut registry = gpfs_exporter::collectors::default_registry().unwrap();
    registry.set_enabled("verbs", true).unwrap();

    let ctx = CollectorContext {
        proc_mounts,
        mounts: vec!["/gpfs/fs1".to_string(), "/gpfs/fs2".to_string()],
        ..CollectorContext::new(Arc::new(runner))
    };
    let collector = GpfsCollector::build(&registry, &ctx).unwrap();
    let prom = Registry::new();
    prom.register(Box::new(collector)).unwrap();
    let text = exposition(&prom);

    assert!(text.contains("gpfs_mount_status{mount=\"/gpfs/fs1\"} 1"));
    assert!(text.contains("gpfs_mount_status{mount=\"/gpfs/fs2\"} 0"));
    assert!(text.contains("gpfs_verbs_status 1"));
    assert!(text.contains("gpfs_state{state=\"active\"} 1"));
    for name in ["mmgetstate", "mount", "verbs"] {
        assert!(text.contains(&format!(
            "gpfs_exporter_collect_error{{collector=\"{}\"}} 0",
            name
        )));
    }
}
