//! Renders controller state to the log.
//!
//! The presentation layer is a plain subscriber of the state channel: it
//! draws whatever the controller publishes and never feeds anything back.

use chrono::{DateTime, SecondsFormat, Utc};
use dashboard::{CyclePhase, DashboardState};
use tokio::sync::watch;
use tracing::{info, warn};

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "NaN".to_string(),
    }
}

fn fmt_updated(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => ms.to_string(),
    }
}

/// Consume state changes until the controller side goes away.
pub async fn run(mut rx: watch::Receiver<DashboardState>) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let state = rx.borrow_and_update().clone();
        render(&state);
    }
}

fn render(state: &DashboardState) {
    if state.phase != CyclePhase::Idle {
        info!(phase = ?state.phase, "cycle in progress");
        return;
    }

    if let Some(ms) = state.last_updated_ms {
        info!("Conditions as of {}", fmt_updated(ms));
    }

    for reading in &state.readings {
        info!(
            "{}: {}°C (feels {}°C), {}% humidity, {} m/s — {}",
            reading.name,
            fmt_opt(reading.temp),
            fmt_opt(reading.feels_like),
            fmt_opt(reading.humidity),
            fmt_opt(reading.wind_speed),
            reading.condition,
        );
    }

    if let Some(summary) = &state.summary {
        info!(
            "Summary {}: avg {:.2}°C (min {:.2} / max {:.2}), {:.2}% humidity, {:.2} m/s, mostly {}",
            summary.date,
            summary.avg_temp,
            summary.min_temp,
            summary.max_temp,
            summary.avg_humidity,
            summary.avg_wind_speed,
            summary.dominant_condition,
        );
    }

    if !state.forecast.is_empty() {
        info!("Forecast: {} steps cached", state.forecast.len());
    }
    if !state.history.is_empty() {
        info!("History: {} stored summaries", state.history.len());
    }

    if let Some(alert) = &state.alert {
        warn!("ALERT: {}", alert);
    }
    if let Some(error) = &state.last_error {
        warn!("{}", error);
    }
}
