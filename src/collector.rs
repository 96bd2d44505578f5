//! The collector capability and the context collectors are built from.

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CollectError;
use crate::runner::CommandRunner;

/// Namespace shared by every metric this exporter emits.
pub const NAMESPACE: &str = "gpfs";

pub const DEFAULT_MMFS_BIN_DIR: &str = "/usr/lpp/mmfs/bin";
pub const DEFAULT_PROC_MOUNTS: &str = "/proc/mounts";

/// One unit of collection, usually backed by a single administrative command.
///
/// Instances are owned by [`GpfsCollector`](crate::aggregate::GpfsCollector),
/// which serializes every call, so implementations only need to be `Send`.
pub trait Collector: Send {
    /// Descriptors of every metric `collect` may emit. Must not run commands.
    fn describe(&self) -> Vec<Desc>;

    /// Performs one collection pass.
    fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError>;
}

/// Dependencies handed to collector factories.
#[derive(Clone)]
pub struct CollectorContext {
    pub runner: Arc<dyn CommandRunner>,
    pub mmfs_bin_dir: PathBuf,
    pub proc_mounts: PathBuf,
    /// Mountpoints the mount collector checks. Empty means ask `mmlsfs`.
    pub mounts: Vec<String>,
}

impl CollectorContext {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            mmfs_bin_dir: PathBuf::from(DEFAULT_MMFS_BIN_DIR),
            proc_mounts: PathBuf::from(DEFAULT_PROC_MOUNTS),
            mounts: Vec::new(),
        }
    }

    /// Full path of an `mm*` binary.
    pub fn binary(&self, name: &str) -> String {
        binary_path(&self.mmfs_bin_dir, name)
    }
}

fn binary_path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

/// Descriptors of a prometheus metric vector, owned.
pub fn descs_of<C: prometheus::core::Collector>(metric: &C) -> Vec<Desc> {
    metric.desc().into_iter().cloned().collect()
}

/// Renders families in the text exposition format.
#[cfg(test)]
pub(crate) fn encode(families: &[MetricFamily]) -> String {
    use prometheus::{Encoder, TextEncoder};

    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(families, &mut buf)
        .expect("encode metric families");
    String::from_utf8(buf).expect("exposition is utf-8")
}
