//! CLI command implementations for gpfs-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `test`: One-shot metrics collection
//! - `collectors`: Collector listing

pub mod check;
pub mod collectors;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use collectors::command_collectors;
pub use config::command_config;
pub use test::command_test;
