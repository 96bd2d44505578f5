//! GPFS mount status collector.
//!
//! Checks that every expected GPFS filesystem is mounted. Expected
//! mountpoints come from configuration or, when none are configured, from
//! the default mountpoints reported by `mmlsfs all -Y -T`.

use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::collector::{descs_of, Collector, CollectorContext, NAMESPACE};
use crate::error::{CollectError, ExecutionError, RegistryError};
use crate::parse::{parse_mmlsfs, query_unescape};
use crate::registry::CollectorRegistry;
use crate::runner::CommandRunner;

pub const NAME: &str = "mount";

const GPFS_FSTYPE: &str = "gpfs";

pub fn register(registry: &mut CollectorRegistry) -> Result<(), RegistryError> {
    registry.register(NAME, true, |ctx| {
        Ok(Box::new(MountCollector::new(ctx)?) as Box<dyn Collector>)
    })
}

pub struct MountCollector {
    runner: Arc<dyn CommandRunner>,
    mmlsfs: String,
    proc_mounts: PathBuf,
    mounts: Vec<String>,
    status: GaugeVec,
}

impl MountCollector {
    pub fn new(ctx: &CollectorContext) -> Result<Self, CollectError> {
        let status = GaugeVec::new(
            Opts::new("status", "GPFS mount status, 1=mounted 0=not mounted")
                .namespace(NAMESPACE)
                .subsystem("mount"),
            &["mount"],
        )?;
        Ok(Self {
            runner: ctx.runner.clone(),
            mmlsfs: ctx.binary("mmlsfs"),
            proc_mounts: ctx.proc_mounts.clone(),
            mounts: ctx.mounts.clone(),
            status,
        })
    }

    fn expected_mounts(&self) -> Result<Vec<String>, CollectError> {
        if !self.mounts.is_empty() {
            return Ok(self.mounts.clone());
        }
        let out = self.runner.run(&self.mmlsfs, &["all", "-Y", "-T"])?;
        Ok(parse_mmlsfs(&out)
            .into_iter()
            .map(|fs| fs.mountpoint)
            .filter(|m| !m.is_empty())
            .collect())
    }

    fn mounted_gpfs(&self) -> Result<HashSet<String>, CollectError> {
        let content =
            fs::read_to_string(&self.proc_mounts).map_err(|e| ExecutionError::Read {
                path: self.proc_mounts.display().to_string(),
                source: e,
            })?;
        Ok(parse_proc_mounts(&content))
    }
}

impl Collector for MountCollector {
    fn describe(&self) -> Vec<Desc> {
        descs_of(&self.status)
    }

    fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        let expected = self.expected_mounts()?;
        let mounted = self.mounted_gpfs()?;

        self.status.reset();
        for mount in &expected {
            let up = mounted.contains(mount);
            if !up {
                debug!("GPFS filesystem {} is not mounted", mount);
            }
            self.status
                .with_label_values(&[mount.as_str()])
                .set(if up { 1.0 } else { 0.0 });
        }
        Ok(self.status.collect())
    }
}

/// Mountpoints of `gpfs` filesystems in a `/proc/mounts` style table.
///
/// The kernel octal-escapes whitespace in mountpoints (`\040` for a space).
fn parse_proc_mounts(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 || parts[2] != GPFS_FSTYPE {
                return None;
            }
            Some(unescape_octal(parts[1]))
        })
        .collect()
}

fn unescape_octal(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal(&bytes[i + 1..i + 4]) {
            let value =
                (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal(digits: &[u8]) -> bool {
    digits.len() == 3 && digits.iter().all(|d| (b'0'..=b'7').contains(d)) && digits[0] <= b'3'
}

/// Splits a comma-separated mount list, decoding query escapes.
pub fn parse_mount_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| query_unescape(m).unwrap_or_else(|_| m.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::encode;
    use crate::runner::StaticRunner;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MMLSFS: &str = "\
mmlsfs::HEADER:version:reserved:reserved:deviceName:fieldName:data:remarks:
mmlsfs::0:1:::project:defaultMountPoint:%2Ffs%2Fproject::
mmlsfs::0:1:::scratch:defaultMountPoint:%2Ffs%2Fscratch::
";

    const PROC_MOUNTS: &str = "\
/dev/sda1 / ext4 rw,relatime 0 0
project /fs/project gpfs rw,relatime 0 0
tmpfs /fs/scratch tmpfs rw 0 0
";

    fn mounts_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn context(runner: StaticRunner, mounts: &NamedTempFile) -> CollectorContext {
        CollectorContext {
            proc_mounts: mounts.path().to_path_buf(),
            ..CollectorContext::new(Arc::new(runner))
        }
    }

    #[test]
    fn test_mount_status_from_mmlsfs() {
        let file = mounts_file(PROC_MOUNTS);
        let ctx = context(StaticRunner::new().stdout("mmlsfs", MMLSFS), &file);
        let mut c = MountCollector::new(&ctx).unwrap();
        let text = encode(&c.collect().unwrap());
        assert!(text.contains("gpfs_mount_status{mount=\"/fs/project\"} 1"));
        assert!(text.contains("gpfs_mount_status{mount=\"/fs/scratch\"} 0"));
    }

    #[test]
    fn test_configured_mounts_skip_mmlsfs() {
        let file = mounts_file(PROC_MOUNTS);
        let runner = Arc::new(StaticRunner::new());
        let ctx = CollectorContext {
            proc_mounts: file.path().to_path_buf(),
            mounts: vec!["/fs/project".into(), "/fs/home".into()],
            ..CollectorContext::new(runner.clone())
        };
        let mut c = MountCollector::new(&ctx).unwrap();
        let text = encode(&c.collect().unwrap());
        assert!(text.contains("gpfs_mount_status{mount=\"/fs/project\"} 1"));
        assert!(text.contains("gpfs_mount_status{mount=\"/fs/home\"} 0"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_mount_table() {
        let ctx = CollectorContext {
            proc_mounts: PathBuf::from("/nonexistent/mounts"),
            mounts: vec!["/fs/project".into()],
            ..CollectorContext::new(Arc::new(StaticRunner::new()))
        };
        let mut c = MountCollector::new(&ctx).unwrap();
        assert!(matches!(
            c.collect(),
            Err(CollectError::Execution(ExecutionError::Read { .. }))
        ));
    }

    #[test]
    fn test_mmlsfs_failure() {
        let file = mounts_file(PROC_MOUNTS);
        let ctx = context(StaticRunner::new().fail("mmlsfs", 1), &file);
        let mut c = MountCollector::new(&ctx).unwrap();
        assert!(c.collect().is_err());
    }

    #[test]
    fn test_parse_proc_mounts_octal() {
        let mounted = parse_proc_mounts("home /gpfs/my\\040home gpfs rw 0 0\n");
        assert!(mounted.contains("/gpfs/my home"));
    }

    #[test]
    fn test_parse_mount_list() {
        assert_eq!(
            parse_mount_list("/fs/project, /fs/scratch,,/fs/my%20home"),
            vec!["/fs/project", "/fs/scratch", "/fs/my home"]
        );
    }
}
