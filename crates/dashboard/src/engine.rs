//! The refresh-cycle state machine.
//!
//! One cycle walks Idle → CheckingCache → Fetching → (Retrying)* →
//! Aggregating → Notifying → Idle. Cycles are driven by an interval timer
//! or a manual refresh message; both share a single select loop, so two
//! cycles can never overlap and queued refresh requests coalesce into one.

use std::time::Duration;

use chrono::Utc;
use common::config::DashConfig;
use common::{ReadingSet, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::aggregate;
use crate::cache::CacheStore;
use crate::gateways::{AlertGateway, SummaryGateway, WeatherGateway};
use crate::state::{CyclePhase, StateHandle};

/// What kicked a cycle off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Timer,
    Manual,
}

/// Owns the refresh cycle and all mutations of the dashboard state.
pub struct Controller<W, S, A> {
    cfg: DashConfig,
    weather: W,
    summaries: S,
    alerts: A,
    cache: CacheStore,
    state: StateHandle,
    cycle_id: u64,
}

impl<W, S, A> Controller<W, S, A>
where
    W: WeatherGateway,
    S: SummaryGateway,
    A: AlertGateway,
{
    pub fn new(
        cfg: DashConfig,
        weather: W,
        summaries: S,
        alerts: A,
        cache: CacheStore,
        state: StateHandle,
    ) -> Self {
        Self {
            cfg,
            weather,
            summaries,
            alerts,
            cache,
            state,
            cycle_id: 0,
        }
    }

    /// Drive cycles until the refresh channel closes.
    ///
    /// The first timer tick fires immediately, so startup behaves like a
    /// manual refresh against whatever the cache holds.
    pub async fn run(mut self, mut refresh_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(Duration::from_secs(self.cfg.timing.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle(CycleTrigger::Timer).await;
                }
                msg = refresh_rx.recv() => {
                    match msg {
                        Some(()) => {
                            // Coalesce a burst of refresh requests into one cycle.
                            while refresh_rx.try_recv().is_ok() {}
                            self.run_cycle(CycleTrigger::Manual).await;
                        }
                        None => break,
                    }
                }
            }
        }

        info!("refresh channel closed, controller stopping");
    }

    /// One full pass of the state machine. Never fails: every error path
    /// ends back at `Idle` with the cache intact.
    pub async fn run_cycle(&mut self, trigger: CycleTrigger) {
        self.cycle_id = self.cycle_id.saturating_add(1);
        let cycle_id = self.cycle_id;
        info!(cycle_id, ?trigger, "starting refresh cycle");

        // ── Checking-Cache ────────────────────────────────────────────
        self.state.set_phase(CyclePhase::CheckingCache);

        let now_ms = Utc::now().timestamp_millis();
        let interval_ms = self.cfg.timing.poll_interval_secs as i64 * 1000;

        if let (Some(ts), Some(cached)) = (self.cache.last_fetch_ms(), self.cache.readings()) {
            if now_ms - ts < interval_ms {
                info!(cycle_id, "cached data is fresh, skipping fetch");
                self.state.update(|s| {
                    s.readings = cached.readings;
                    s.last_updated_ms = Some(cached.fetched_at_ms);
                    s.phase = CyclePhase::Idle;
                });
                return;
            }
        }

        // ── Fetching / Retrying ───────────────────────────────────────
        self.state.set_phase(CyclePhase::Fetching);

        let fetched = match self.fetch_with_retry(cycle_id).await {
            Ok(set) => set,
            Err(e) => {
                warn!(cycle_id, error = %e, "fetch failed after retries");
                self.state.update(|s| {
                    s.last_error = Some(
                        "Unable to fetch weather data. Please check your connection.".into(),
                    );
                    s.phase = CyclePhase::Idle;
                });
                return;
            }
        };

        if fetched.readings.is_empty() {
            warn!(cycle_id, "provider returned no readings");
            self.state.update(|s| {
                s.readings.clear();
                s.phase = CyclePhase::Idle;
            });
            return;
        }

        let fresh = aggregate::convert_readings(fetched);

        // ── Change detection ──────────────────────────────────────────
        let baseline = self
            .cache
            .readings()
            .map(|s| s.readings)
            .unwrap_or_default();

        if !aggregate::is_significant_change(&fresh.readings, &baseline) {
            info!(cycle_id, "no significant change in weather data");
            self.state.set_phase(CyclePhase::Idle);
            return;
        }

        if let Err(e) = self.cache.store_readings(&fresh) {
            warn!(cycle_id, error = %e, "cache update failed");
        }
        self.state.update(|s| {
            s.readings = fresh.readings.clone();
            s.last_updated_ms = Some(fresh.fetched_at_ms);
            s.last_error = None;
        });

        // ── Aggregating ───────────────────────────────────────────────
        self.state.set_phase(CyclePhase::Aggregating);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        if let Some(summary) = aggregate::daily_summary(&fresh.readings, &date) {
            self.state.update(|s| s.summary = Some(summary.clone()));

            match self.summaries.save(&summary).await {
                Ok(()) => {
                    info!(cycle_id, date = %summary.date, "daily summary saved");
                    match self.summaries.list().await {
                        Ok(history) => self.state.update(|s| s.history = history),
                        Err(e) => {
                            warn!(cycle_id, error = %e, "summary history refresh failed");
                        }
                    }
                }
                Err(e) => {
                    error!(cycle_id, error = %e, "failed to save daily summary");
                    self.state.update(|s| {
                        s.last_error = Some(format!("Could not save daily summary: {e}"));
                    });
                }
            }
        } else {
            info!(cycle_id, "no usable temperatures, aggregation skipped");
        }

        // ── Notifying ─────────────────────────────────────────────────
        self.state.set_phase(CyclePhase::Notifying);

        match aggregate::alert_message(&fresh.readings, self.cfg.threshold_temp_c) {
            Some(message) => {
                warn!(cycle_id, %message, "alert threshold breached");
                self.state.update(|s| s.alert = Some(message.clone()));
                if let Err(e) = self.alerts.send("Weather Alert", &message).await {
                    warn!(cycle_id, error = %e, "alert notification failed");
                }
            }
            None => self.state.update(|s| s.alert = None),
        }

        self.state.set_phase(CyclePhase::Idle);
    }

    /// Fetch with linear backoff: attempt n waits n × the configured step
    /// (2 s, 4 s, 6 s by default) before retrying. Only transport and
    /// gateway failures are retried.
    async fn fetch_with_retry(&self, cycle_id: u64) -> Result<ReadingSet> {
        let max_retries = self.cfg.timing.max_retries;
        let step = Duration::from_millis(self.cfg.timing.retry_step_ms);

        let mut attempt: u32 = 0;
        loop {
            match self.weather.fetch_current().await {
                Ok(set) => return Ok(set),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    self.state.set_phase(CyclePhase::Retrying { attempt });
                    warn!(cycle_id, attempt, error = %e, "fetch failed, retrying");
                    sleep(step * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::state::StateHandle;
    use async_trait::async_trait;
    use common::{Condition, DailySummary, Error, ForecastPoint, Reading};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn kelvin(celsius: f64) -> f64 {
        celsius + 273.15
    }

    fn reading(name: &str, temp_kelvin: Option<f64>) -> Reading {
        Reading {
            id: 1,
            name: name.into(),
            condition: Condition::Clear,
            description: String::new(),
            temp: temp_kelvin,
            feels_like: temp_kelvin,
            humidity: Some(50.0),
            wind_speed: Some(2.0),
        }
    }

    fn kelvin_set(temps_c: &[f64]) -> ReadingSet {
        ReadingSet {
            fetched_at_ms: Utc::now().timestamp_millis(),
            readings: temps_c
                .iter()
                .enumerate()
                .map(|(i, t)| reading(&format!("city-{i}"), Some(kelvin(*t))))
                .collect(),
        }
    }

    /// Weather gateway that replays a scripted sequence of results.
    #[derive(Clone, Default)]
    struct ScriptedWeather {
        script: Arc<Mutex<VecDeque<std::result::Result<ReadingSet, Error>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedWeather {
        fn push_ok(&self, set: ReadingSet) {
            self.script.lock().unwrap().push_back(Ok(set));
        }

        fn push_err(&self) {
            self.script
                .lock()
                .unwrap()
                .push_back(Err(Error::Gateway("scripted failure".into())));
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherGateway for ScriptedWeather {
        async fn fetch_current(&self) -> Result<ReadingSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Gateway("script exhausted".into())))
        }

        async fn fetch_forecast(&self) -> Result<Vec<ForecastPoint>> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSummaries {
        saved: Arc<Mutex<Vec<DailySummary>>>,
        fail_saves: Arc<Mutex<bool>>,
    }

    impl RecordingSummaries {
        fn saved_count(&self) -> usize {
            self.saved.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SummaryGateway for RecordingSummaries {
        async fn save(&self, summary: &DailySummary) -> Result<()> {
            if *self.fail_saves.lock().unwrap() {
                return Err(common::PersistenceError::NoResponse(
                    "scripted outage".into(),
                )
                .into());
            }
            self.saved.lock().unwrap().push(summary.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<DailySummary>> {
            let mut all = self.saved.lock().unwrap().clone();
            all.reverse();
            Ok(all)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAlerts {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingAlerts {
        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlertGateway for RecordingAlerts {
        async fn send(&self, subject: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        controller: Controller<ScriptedWeather, RecordingSummaries, RecordingAlerts>,
        weather: ScriptedWeather,
        summaries: RecordingSummaries,
        alerts: RecordingAlerts,
        state: StateHandle,
        cache: CacheStore,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CacheStore::open(dir.path()).expect("cache");
        let (state, _rx) = StateHandle::new();

        let weather = ScriptedWeather::default();
        let summaries = RecordingSummaries::default();
        let alerts = RecordingAlerts::default();

        let controller = Controller::new(
            DashConfig::default(),
            weather.clone(),
            summaries.clone(),
            alerts.clone(),
            cache.clone(),
            state.clone(),
        );

        Fixture {
            controller,
            weather,
            summaries,
            alerts,
            state,
            cache,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds_with_single_aggregation() {
        let mut fx = fixture();
        fx.weather.push_err();
        fx.weather.push_err();
        fx.weather.push_err();
        fx.weather.push_ok(kelvin_set(&[30.0, 28.0]));

        fx.controller.run_cycle(CycleTrigger::Timer).await;

        assert_eq!(fx.weather.call_count(), 4);
        assert_eq!(fx.summaries.saved_count(), 1);

        let state = fx.state.snapshot();
        assert_eq!(state.last_error, None);
        assert_eq!(state.phase, CyclePhase::Idle);
        assert_eq!(state.readings.len(), 2);
        assert!(fx.cache.readings().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_error_and_keep_cache() {
        let mut fx = fixture();

        // Seed a stale cached set so the fetch runs and failure rollback
        // can be observed.
        let mut stale = kelvin_set(&[25.0]);
        stale = aggregate::convert_readings(stale);
        stale.fetched_at_ms = Utc::now().timestamp_millis() - 3_600_000;
        fx.cache.store_readings(&stale).expect("seed cache");

        for _ in 0..4 {
            fx.weather.push_err();
        }

        fx.controller.run_cycle(CycleTrigger::Timer).await;

        assert_eq!(fx.weather.call_count(), 4);
        assert_eq!(fx.summaries.saved_count(), 0);

        let state = fx.state.snapshot();
        assert!(state.last_error.is_some());
        assert_eq!(state.phase, CyclePhase::Idle);
        assert_eq!(fx.cache.readings(), Some(stale));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_short_circuits_without_fetching() {
        let mut fx = fixture();

        let mut cached = aggregate::convert_readings(kelvin_set(&[25.0, 26.0]));
        cached.fetched_at_ms = Utc::now().timestamp_millis();
        fx.cache.store_readings(&cached).expect("seed cache");

        fx.controller.run_cycle(CycleTrigger::Manual).await;

        assert_eq!(fx.weather.call_count(), 0);
        let state = fx.state.snapshot();
        assert_eq!(state.readings, cached.readings);
        assert_eq!(state.phase, CyclePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_data_is_discarded() {
        let mut fx = fixture();

        let mut cached = aggregate::convert_readings(kelvin_set(&[25.0, 26.0]));
        cached.fetched_at_ms = Utc::now().timestamp_millis() - 3_600_000;
        fx.cache.store_readings(&cached).expect("seed cache");

        // Same temperatures at the same positions — not significant.
        fx.weather.push_ok(kelvin_set(&[25.0, 26.0]));

        fx.controller.run_cycle(CycleTrigger::Timer).await;

        assert_eq!(fx.weather.call_count(), 1);
        assert_eq!(fx.summaries.saved_count(), 0);
        // Cache timestamp untouched: the stale entry is still there.
        assert_eq!(fx.cache.last_fetch_ms(), Some(cached.fetched_at_ms));
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_is_set_then_cleared() {
        let mut fx = fixture();

        fx.weather.push_ok(kelvin_set(&[36.0, 37.0]));
        fx.controller.run_cycle(CycleTrigger::Timer).await;

        let state = fx.state.snapshot();
        assert_eq!(
            state.alert.as_deref(),
            Some("Temperature exceeded 35°C for two consecutive updates!")
        );
        assert_eq!(fx.alerts.sent_count(), 1);

        // Next poll window: one of the last two cools off.
        let mut stale = fx.cache.readings().expect("cached set");
        stale.fetched_at_ms = Utc::now().timestamp_millis() - 3_600_000;
        fx.cache.store_readings(&stale).expect("age cache");

        fx.weather.push_ok(kelvin_set(&[36.0, 34.0]));
        fx.controller.run_cycle(CycleTrigger::Timer).await;

        let state = fx.state.snapshot();
        assert_eq!(state.alert, None);
        assert_eq!(fx.alerts.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_is_surfaced_but_not_fatal() {
        let mut fx = fixture();
        *fx.summaries.fail_saves.lock().unwrap() = true;

        fx.weather.push_ok(kelvin_set(&[36.0, 37.0]));
        fx.controller.run_cycle(CycleTrigger::Timer).await;

        let state = fx.state.snapshot();
        // The in-memory aggregate survives the failed save.
        assert!(state.summary.is_some());
        assert!(state
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("Could not save daily summary")));
        // Notifying still ran.
        assert_eq!(fx.alerts.sent_count(), 1);
        assert_eq!(state.phase, CyclePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_is_not_cached() {
        let mut fx = fixture();

        fx.weather.push_ok(ReadingSet {
            fetched_at_ms: Utc::now().timestamp_millis(),
            readings: Vec::new(),
        });

        fx.controller.run_cycle(CycleTrigger::Timer).await;

        assert_eq!(fx.cache.readings(), None);
        assert_eq!(fx.summaries.saved_count(), 0);
        let state = fx.state.snapshot();
        assert!(state.readings.is_empty());
        assert_eq!(state.phase, CyclePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_refreshes_after_save() {
        let mut fx = fixture();

        fx.weather.push_ok(kelvin_set(&[30.0]));
        fx.controller.run_cycle(CycleTrigger::Timer).await;

        let state = fx.state.snapshot();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0], state.summary.clone().expect("summary"));
    }
}
