//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with the available endpoints and collectors.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::{CollectorInfo, SharedState};

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let health_item = if state.config.enable_health.unwrap_or(true) {
        r#"<li>
            <a href="/health">/health</a>
            <div class="endpoint-desc">Outcome of the last pass of every collector (text)</div>
        </li>"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GPFS Exporter</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            border-bottom: 3px solid #007bff;
            padding-bottom: 15px;
        }}
        .endpoint-list {{
            list-style: none;
            padding: 0;
        }}
        .endpoint-list li {{
            margin: 20px 0;
            padding: 15px;
            background: #f8f9fa;
            border-left: 4px solid #007bff;
            border-radius: 4px;
        }}
        .endpoint-list a {{
            color: #007bff;
            text-decoration: none;
            font-weight: 600;
        }}
        .endpoint-desc {{
            color: #666;
            margin-top: 5px;
        }}
        table {{ border-collapse: collapse; }}
        td, th {{ padding: 4px 12px; border-bottom: 1px solid #ddd; text-align: left; }}
        code {{
            background: #e9ecef;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: 'Courier New', monospace;
        }}
    </style>
</head>
<body>
<div class="container">
    <h1>GPFS Exporter</h1>
    <p>Version {version} &middot; Uptime {uptime}</p>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
        <li>
            <a href="/metrics">/metrics</a>
            <div class="endpoint-desc">Prometheus-compatible metrics endpoint</div>
        </li>
        {health_item}
    </ul>

    <h2>Collectors</h2>
    {collectors}
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        health_item = health_item,
        collectors = render_collector_table(&state.collectors),
    );

    Html(html)
}

fn render_collector_table(collectors: &[CollectorInfo]) -> String {
    let mut rows = String::new();
    for c in collectors {
        rows.push_str(&format!(
            "<tr><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
            c.name,
            if c.enabled { "enabled" } else { "disabled" },
            if c.default_enabled { "enabled" } else { "disabled" },
        ));
    }
    format!(
        "<table>\n<tr><th>Collector</th><th>State</th><th>Default</th></tr>\n{}</table>",
        rows
    )
}
