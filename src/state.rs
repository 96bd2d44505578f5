//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use gpfs_exporter::ScrapeStatus;
use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Registration summary of one collector, for the landing page.
#[derive(Debug, Clone)]
pub struct CollectorInfo {
    pub name: String,
    pub default_enabled: bool,
    pub enabled: bool,
}

/// Global application state shared across requests.
pub struct AppState {
    /// Prometheus registry holding the aggregate GPFS collector.
    pub registry: Registry,
    pub scrape_duration: Gauge,
    /// Latest per-collector outcomes.
    pub status: ScrapeStatus,
    pub collectors: Vec<CollectorInfo>,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
