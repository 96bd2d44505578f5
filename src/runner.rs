//! External command execution.
//!
//! Every collector that shells out to an administrative command does so
//! through a [`CommandRunner`] handed to it at construction time, so tests
//! can substitute [`StaticRunner`] and never spawn a real process.

use std::collections::HashMap;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ExecutionError;

/// Runs an external program and returns its captured standard output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecutionError>;
}

/// Runs commands on the host, optionally through `sudo`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    sudo: bool,
}

impl SystemRunner {
    pub fn new(sudo: bool) -> Self {
        Self { sudo }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecutionError> {
        let mut cmd = if self.sudo {
            let mut c = Command::new("sudo");
            c.arg(program);
            c
        } else {
            Command::new(program)
        };
        cmd.args(args);

        debug!("Executing {} {}", program, args.join(" "));

        let output = cmd.output().map_err(|e| {
            error!("Failed to execute {}: {}", program, e);
            ExecutionError::Spawn {
                program: program.to_string(),
                source: e,
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            );
            return Err(ExecutionError::Status {
                program: program.to_string(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Canned response for a program run by [`StaticRunner`].
#[derive(Debug, Clone)]
enum Reply {
    Stdout(String),
    Exit(i32),
}

/// Deterministic runner that replays canned output keyed by program name.
///
/// The key is the final path component of the program, so collectors that
/// resolve binaries under a configured directory match a bare `"mmlsfs"`.
/// It also tracks how many invocations overlap, which the concurrency tests
/// use to prove scrapes are serialized.
#[derive(Debug, Default)]
pub struct StaticRunner {
    replies: Mutex<HashMap<String, Reply>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every invocation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn stdout(self, program: &str, out: &str) -> Self {
        self.set(program, Reply::Stdout(out.to_string()));
        self
    }

    /// Make `program` exit with the given non-zero code.
    pub fn fail(self, program: &str, code: i32) -> Self {
        self.set(program, Reply::Exit(code));
        self
    }

    fn set(&self, program: &str, reply: Reply) {
        let mut replies = self.replies.lock().unwrap_or_else(|p| p.into_inner());
        replies.insert(program.to_string(), reply);
    }

    /// Programs invoked so far, in order, by short name.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Highest number of invocations that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl CommandRunner for StaticRunner {
    fn run(&self, program: &str, _args: &[&str]) -> Result<String, ExecutionError> {
        let key = program.rsplit('/').next().unwrap_or(program).to_string();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(key.clone());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&key)
            .cloned();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Stdout(out)) => Ok(out),
            Some(Reply::Exit(code)) => Err(ExecutionError::Code { program: key, code }),
            None => Err(ExecutionError::Spawn {
                program: key,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no canned output"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_runner_replays_by_short_name() {
        let runner = StaticRunner::new().stdout("mmlsfs", "out\n");
        let out = runner.run("/usr/lpp/mmfs/bin/mmlsfs", &["all"]).unwrap();
        assert_eq!(out, "out\n");
        assert_eq!(runner.calls(), vec!["mmlsfs".to_string()]);
    }

    #[test]
    fn test_static_runner_failures() {
        let runner = StaticRunner::new().fail("mmgetstate", 1);
        assert!(matches!(
            runner.run("mmgetstate", &[]),
            Err(ExecutionError::Code { code: 1, .. })
        ));
        assert!(matches!(
            runner.run("unknown", &[]),
            Err(ExecutionError::Spawn { .. })
        ));
    }

    #[test]
    fn test_system_runner_captures_stdout() {
        let runner = SystemRunner::new(false);
        let out = runner.run("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_system_runner_nonzero_exit() {
        let runner = SystemRunner::new(false);
        assert!(matches!(
            runner.run("false", &[]),
            Err(ExecutionError::Status { .. })
        ));
    }

    #[test]
    fn test_system_runner_missing_binary() {
        let runner = SystemRunner::new(false);
        assert!(matches!(
            runner.run("/nonexistent/gpfs-exporter-test-binary", &[]),
            Err(ExecutionError::Spawn { .. })
        ));
    }
}
