//! Dashboard configuration types.

use serde::{Deserialize, Serialize};

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// Weather provider API key.
    #[serde(default)]
    pub api_key: String,

    /// Locations polled each cycle.
    #[serde(default = "default_locations")]
    pub locations: Vec<LocationConfig>,

    /// Base URL of the weather provider.
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,

    /// Base URL of the summary API.
    #[serde(default = "default_summary_api_url")]
    pub summary_api_url: String,

    /// Base URL of the email-send endpoint.
    #[serde(default = "default_alert_api_url")]
    pub alert_api_url: String,

    /// Alert threshold in °C; an alert fires when the last two readings
    /// both exceed it.
    #[serde(default = "default_threshold")]
    pub threshold_temp_c: f64,

    /// Directory holding the persisted cache entries.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Timing parameters.
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Configuration for a single polled location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Human-readable name.
    pub name: String,
    /// Provider city id.
    pub id: u64,
}

/// Timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Poll interval in seconds; cached data younger than this
    /// short-circuits a cycle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Additional fetch attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; attempt n waits n × this.
    #[serde(default = "default_retry_step_ms")]
    pub retry_step_ms: u64,

    /// Forecast refresh interval in seconds.
    #[serde(default = "default_forecast_interval")]
    pub forecast_interval_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}

fn default_summary_api_url() -> String {
    "http://127.0.0.1:5001".into()
}

fn default_alert_api_url() -> String {
    "http://127.0.0.1:5001".into()
}

fn default_threshold() -> f64 {
    35.0
}

fn default_cache_dir() -> String {
    ".weather-dash".into()
}

fn default_poll_interval() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_step_ms() -> u64 {
    2000
}

fn default_forecast_interval() -> u64 {
    1800
}

fn default_locations() -> Vec<LocationConfig> {
    vec![
        LocationConfig {
            name: "Delhi".into(),
            id: 1273294,
        },
        LocationConfig {
            name: "Mumbai".into(),
            id: 1275339,
        },
        LocationConfig {
            name: "Chennai".into(),
            id: 1264527,
        },
        LocationConfig {
            name: "Bangalore".into(),
            id: 1277333,
        },
        LocationConfig {
            name: "Kolkata".into(),
            id: 1275004,
        },
        LocationConfig {
            name: "Hyderabad".into(),
            id: 1269843,
        },
    ]
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_retries: default_max_retries(),
            retry_step_ms: default_retry_step_ms(),
            forecast_interval_secs: default_forecast_interval(),
        }
    }
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            locations: default_locations(),
            weather_base_url: default_weather_base_url(),
            summary_api_url: default_summary_api_url(),
            alert_api_url: default_alert_api_url(),
            threshold_temp_c: default_threshold(),
            cache_dir: default_cache_dir(),
            timing: TimingConfig::default(),
        }
    }
}
