//! Domain types shared across the dashboard.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weather condition category as reported by the provider.
///
/// Categories outside the known set collapse into `Other` on
/// deserialization rather than failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Drizzle,
    Mist,
    Haze,
    Fog,
    Other,
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Snow" => Self::Snow,
            "Thunderstorm" => Self::Thunderstorm,
            "Drizzle" => Self::Drizzle,
            "Mist" => Self::Mist,
            "Haze" => Self::Haze,
            "Fog" => Self::Fog,
            _ => Self::Other,
        }
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Mist => "Mist",
            Self::Haze => "Haze",
            Self::Fog => "Fog",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// One location's current conditions from a single poll cycle.
///
/// `temp` and `feels_like` arrive from the gateway in Kelvin and are
/// rewritten to display units (°C) by the controller's conversion pass.
/// `None` marks a value the provider omitted or sent as non-finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub name: String,
    pub condition: Condition,
    #[serde(default)]
    pub description: String,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Wind speed in m/s.
    pub wind_speed: Option<f64>,
}

/// One poll's batch of readings plus its fetch timestamp.
///
/// Cached sets are never empty — an empty provider result is treated as a
/// fetch failure and never written to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSet {
    /// Epoch milliseconds of the fetch.
    pub fetched_at_ms: i64,
    pub readings: Vec<Reading>,
}

/// A single forecast step for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Provider timestamp string for the step.
    pub at: String,
    pub condition: Condition,
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Daily aggregate pushed to the summary store.
///
/// Wire field names match the store's schema; numeric values carry
/// 2-decimal precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
    pub dominant_condition: Condition,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
}
