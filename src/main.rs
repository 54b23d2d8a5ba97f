//! Weather dashboard daemon.
//!
//! Single-binary Tokio application that:
//! 1. Polls current conditions for the configured locations
//! 2. Detects significant changes and computes daily aggregates
//! 3. Persists summaries to the summary API
//! 4. Raises threshold alerts through the email endpoint
//! 5. Publishes state for the presentation layer

mod config;
mod presenter;

use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use dashboard::cache::CacheStore;
use dashboard::{Controller, CycleTrigger, StateHandle};
use mailer_client::MailerClient;
use openweather_client::OpenWeatherClient;
use summary_client::SummaryClient;

/// Weather dashboard polling daemon
#[derive(Parser)]
#[command(name = "weather-dash", about = "Weather dashboard polling daemon")]
struct Cli {
    /// Run a single refresh cycle, print the outcome, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_dash=info,dashboard=info,openweather_client=info,summary_client=info,mailer_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("Weather dashboard starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Locations: {:?}",
        cfg.locations.iter().map(|l| &l.name).collect::<Vec<_>>()
    );
    info!(
        "Polling: every {}s, {} retries with {}ms backoff step, alert above {}°C",
        cfg.timing.poll_interval_secs,
        cfg.timing.max_retries,
        cfg.timing.retry_step_ms,
        cfg.threshold_temp_c,
    );

    let cache = match CacheStore::open(&cfg.cache_dir) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to open cache: {}", e);
            std::process::exit(1);
        }
    };

    let weather = OpenWeatherClient::with_base_url(
        cfg.weather_base_url.clone(),
        cfg.api_key.clone(),
        cfg.locations.clone(),
    );
    let summaries = SummaryClient::new(cfg.summary_api_url.clone());
    let mailer = MailerClient::new(cfg.alert_api_url.clone());

    let (state, state_rx) = StateHandle::new();
    let (refresh_tx, refresh_rx) = mpsc::channel::<()>(4);

    let mut controller = Controller::new(
        cfg.clone(),
        weather.clone(),
        summaries.clone(),
        mailer,
        cache,
        state.clone(),
    );

    // ── Once mode ────────────────────────────────────────────────────
    if cli.once {
        info!("Running single refresh cycle...");
        controller.run_cycle(CycleTrigger::Manual).await;

        let snapshot = state.snapshot();
        info!("Readings: {}", snapshot.readings.len());
        if let Some(summary) = &snapshot.summary {
            info!(
                "Summary for {}: avg {:.2}°C, mostly {}",
                summary.date, summary.avg_temp, summary.dominant_condition
            );
        }
        if let Some(alert) = &snapshot.alert {
            warn!("Alert: {}", alert);
        }
        if let Some(err) = &snapshot.last_error {
            warn!("Error: {}", err);
        }
        return;
    }

    // ── Spawn tasks ──────────────────────────────────────────────────
    info!("Spawning tasks...");

    // Task 1: the polling controller.
    let controller_handle = tokio::spawn(controller.run(refresh_rx));

    // Task 2: forecast refresh.
    let fc_weather = weather.clone();
    let fc_state = state.clone();
    let fc_interval = cfg.timing.forecast_interval_secs;
    let forecast_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(fc_interval));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match fc_weather.fetch_forecast().await {
                Ok(points) => {
                    let points = dashboard::aggregate::convert_forecast(points);
                    info!("Forecast updated: {} steps", points.len());
                    fc_state.update(|s| s.forecast = points);
                }
                Err(e) => {
                    warn!("Forecast refresh failed: {}", e);
                }
            }
        }
    });

    // Task 3: one-shot summary history bootstrap. The controller keeps
    // history current after each save; this only fills the screen on
    // startup.
    let hist_client = summaries.clone();
    let hist_state = state.clone();
    tokio::spawn(async move {
        match hist_client.list().await {
            Ok(history) => {
                info!("Loaded {} stored summaries", history.len());
                hist_state.update(|s| s.history = history);
            }
            Err(e) => {
                warn!("Could not load summary history: {}", e);
            }
        }
    });

    // Task 4: presentation.
    let presenter_handle = tokio::spawn(presenter::run(state_rx));

    // Manual refresh on SIGUSR1 (the daemon's pull-to-refresh).
    #[cfg(unix)]
    {
        let refresh = refresh_tx.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut usr1 = match signal(SignalKind::user_defined1()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("SIGUSR1 handler unavailable, manual refresh disabled: {}", e);
                    return;
                }
            };
            while usr1.recv().await.is_some() {
                info!("Manual refresh requested");
                // A full queue means a cycle is already pending; the
                // controller coalesces, so dropping the signal is fine.
                let _ = refresh.try_send(());
            }
        });
    }

    // ── Wait for shutdown ────────────────────────────────────────────
    info!("Weather dashboard is running. Press Ctrl+C to stop (SIGUSR1 refreshes).");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        r = controller_handle => {
            error!("Controller task exited: {:?}", r);
        }
        r = forecast_handle => {
            error!("Forecast task exited: {:?}", r);
        }
        r = presenter_handle => {
            error!("Presenter task exited: {:?}", r);
        }
    }

    // Tasks are dropped with the runtime; any in-flight fetch result dies
    // with its task instead of touching released state.
    info!("Weather dashboard shut down.");
}
