//! GPFS Exporter Library
//!
//! Collects facts about an IBM Spectrum Scale (GPFS) cluster by running its
//! administrative commands, parsing their output and exposing the results
//! as Prometheus metrics.
//!
//! # Architecture
//!
//! - [`runner`]: runs external commands; [`runner::StaticRunner`] replays
//!   canned output for tests
//! - [`parse`]: tolerant parsers for `mm*` command output
//! - [`collector`]: the [`Collector`] capability
//! - [`registry`]: named collectors with enable switches
//! - [`aggregate`]: [`GpfsCollector`], the single collector registered with
//!   Prometheus, which runs the enabled collectors once per scrape
//!
//! # Usage
//!
//! ```rust
//! use gpfs_exporter::collectors::default_registry;
//! use gpfs_exporter::runner::StaticRunner;
//! use gpfs_exporter::{CollectorContext, GpfsCollector};
//! use std::sync::Arc;
//!
//! let mut registry = default_registry().unwrap();
//! registry.set_enabled("mount", false).unwrap();
//!
//! let runner = StaticRunner::new().stdout(
//!     "mmgetstate",
//!     "mmgetstate::0:1:::node1:1:active:1:1:1:::\n",
//! );
//! let ctx = CollectorContext::new(Arc::new(runner));
//! let collector = GpfsCollector::build(&registry, &ctx).unwrap();
//!
//! let prom = prometheus::Registry::new();
//! prom.register(Box::new(collector)).unwrap();
//! assert!(!prom.gather().is_empty());
//! ```

pub mod aggregate;
pub mod collector;
pub mod collectors;
pub mod error;
pub mod parse;
pub mod registry;
pub mod runner;

// Re-export main types for convenience
pub use aggregate::{CollectorSummary, GpfsCollector, ScrapeStatus};
pub use collector::{Collector, CollectorContext};
pub use error::{CollectError, ExecutionError, ParseError, RegistryError};
pub use registry::CollectorRegistry;
