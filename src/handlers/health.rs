//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports the
//! outcome of the most recent pass of every enabled collector.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use gpfs_exporter::CollectorSummary;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let snapshot = state.status.snapshot();
    let failed = snapshot
        .iter()
        .filter(|(_, s)| s.as_ref().is_some_and(|s| s.error.is_some()))
        .count();

    let (status, message) = if failed == 0 {
        (StatusCode::OK, "OK".to_string())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{} collector(s) failed on last scrape", failed),
        )
    };

    let uptime_hours = state.start_time.elapsed().as_secs_f64() / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = render_collectors(&snapshot);

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}"),
    )
}

/// Renders per-collector outcomes as a plain-text table.
pub fn render_collectors(snapshot: &[(String, Option<CollectorSummary>)]) -> String {
    let mut out = String::new();
    writeln!(out, "COLLECTORS").ok();
    writeln!(out, "==========").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "{:15} | {:>12} | {:>14} | {}",
        "Collector", "Duration (s)", "Last run", "Status"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(60)).ok();

    for (name, summary) in snapshot {
        match summary {
            Some(s) => {
                let outcome = s.error.as_deref().unwrap_or("ok");
                writeln!(
                    out,
                    "{:15} | {:>12.3} | {:>14} | {}",
                    name, s.duration_seconds, s.last_execution, outcome
                )
                .ok();
            }
            None => {
                writeln!(out, "{:15} | {:>12} | {:>14} | not run yet", name, "-", "-").ok();
            }
        }
    }
    out
}
