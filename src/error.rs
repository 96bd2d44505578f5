//! Error types for command execution, output parsing and collector orchestration.

use std::process::ExitStatus;

/// An external administrative command could not be run or exited abnormally.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Status { program: String, status: ExitStatus },

    #[error("{program} exited with code {code}")]
    Code { program: String, code: i32 },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Command output did not have the structure a parser requires.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("pattern '{0}' not found in command output")]
    PatternNotFound(String),

    #[error("no data rows in {0} output")]
    NoData(&'static str),

    #[error("invalid percent-encoding in '{0}'")]
    InvalidEscape(String),
}

/// Failure of a single collector pass.
///
/// Never fatal to a scrape: the aggregate reports it through the
/// `collect_error` bookkeeping gauge and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("metric error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Misuse of the collector registry during startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("collector '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown collector '{0}'")]
    Unknown(String),

    #[error("failed to construct collector '{name}': {source}")]
    Factory {
        name: String,
        #[source]
        source: CollectError,
    },
}
