//! Configuration loader — merges env vars, .env file, and config.toml.

use common::config::DashConfig;
use common::{Error, Result};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &DashConfig) -> Result<()> {
    let mut issues: Vec<String> = Vec::new();

    if config.locations.is_empty() {
        issues.push("locations must contain at least one entry".into());
    }
    if config.weather_base_url.trim().is_empty() {
        issues.push("weather_base_url must not be empty".into());
    }
    if config.summary_api_url.trim().is_empty() {
        issues.push("summary_api_url must not be empty".into());
    }
    if config.alert_api_url.trim().is_empty() {
        issues.push("alert_api_url must not be empty".into());
    }
    if !config.threshold_temp_c.is_finite() {
        issues.push("threshold_temp_c must be a finite number".into());
    }
    if config.timing.poll_interval_secs == 0 {
        issues.push("timing.poll_interval_secs must be > 0".into());
    }
    if config.timing.retry_step_ms == 0 {
        issues.push("timing.retry_step_ms must be > 0".into());
    }
    if config.timing.forecast_interval_secs == 0 {
        issues.push("timing.forecast_interval_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load dashboard configuration from environment and optional config file.
pub fn load_config() -> Result<DashConfig> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = DashConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
        config.api_key = key;
    }
    if let Ok(url) = std::env::var("WEATHER_BASE_URL") {
        config.weather_base_url = url;
    }
    if let Ok(url) = std::env::var("SUMMARY_API_URL") {
        config.summary_api_url = url;
    }
    if let Ok(url) = std::env::var("ALERT_API_URL") {
        config.alert_api_url = url;
    }
    if let Ok(dir) = std::env::var("CACHE_DIR") {
        config.cache_dir = dir;
    }
    if let Ok(raw) = std::env::var("POLL_INTERVAL_SECS") {
        config.timing.poll_interval_secs = parse_positive_u64(&raw, "POLL_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("FORECAST_INTERVAL_SECS") {
        config.timing.forecast_interval_secs =
            parse_positive_u64(&raw, "FORECAST_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("ALERT_THRESHOLD_C") {
        config.threshold_temp_c = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Config("ALERT_THRESHOLD_C must be a number".into()))?;
    }

    // 5. Validate required fields.
    if config.api_key.is_empty() {
        return Err(Error::Config(
            "OPENWEATHER_API_KEY is required (set in .env or environment)".into(),
        ));
    }

    validate_config(&config)?;

    Ok(config)
}
