//! OpenWeather API client.
//!
//! Fetches current conditions for the configured location batch plus the
//! shared forecast feed, and normalizes the provider payload into the
//! dashboard's `Reading`/`ForecastPoint` shapes. Temperatures are left in
//! Kelvin — unit conversion is the controller's job. No retries here
//! either; the polling loop owns that policy.

use chrono::Utc;
use common::config::LocationConfig;
use common::{Condition, Error, ForecastPoint, Reading, ReadingSet, Result};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeather client with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    locations: Vec<LocationConfig>,
}

// ── Provider response types ───────────────────────────────────────────

/// Batched current-conditions response from `/group`.
#[derive(Debug, Deserialize)]
pub struct GroupResponse {
    #[serde(default)]
    pub list: Option<Vec<CityEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct CityEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weather: Vec<WeatherDesc>,
    #[serde(default)]
    pub main: Option<MainBlock>,
    #[serde(default)]
    pub wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherDesc {
    pub main: Condition,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WindBlock {
    #[serde(default)]
    pub speed: Option<f64>,
}

/// Forecast response from `/forecast`.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Option<Vec<ForecastEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    #[serde(default)]
    pub dt_txt: String,
    #[serde(default)]
    pub main: Option<MainBlock>,
    #[serde(default)]
    pub wind: Option<WindBlock>,
    #[serde(default)]
    pub weather: Vec<WeatherDesc>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenWeatherClient {
    pub fn new(api_key: String, locations: Vec<LocationConfig>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, locations)
    }

    /// Create a client against an alternative base URL (tests).
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        locations: Vec<LocationConfig>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("weather-dash/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build OpenWeather HTTP client");

        Self {
            client,
            base_url,
            api_key,
            locations,
        }
    }

    /// Comma-joined id list for the batched endpoints.
    fn id_param(&self) -> String {
        self.locations
            .iter()
            .map(|l| l.id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Fetch current conditions for every configured location in one
    /// batched request.
    pub async fn fetch_current(&self) -> Result<ReadingSet> {
        let url = format!("{}/group", self.base_url);

        debug!("Fetching current weather: {} ids={}", url, self.id_param());

        let resp = self
            .client
            .get(&url)
            .query(&[("id", self.id_param()), ("appid", self.api_key.clone())])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("current-weather request failed: {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Gateway(format!(
                "weather provider returned {}: {}",
                status,
                clip(&body)
            )));
        }

        let payload: GroupResponse = resp
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("current-weather JSON parse error: {e}")))?;

        let Some(list) = payload.list else {
            return Err(Error::Gateway(
                "current-weather response carried no list payload".into(),
            ));
        };

        let readings: Vec<Reading> = list.into_iter().map(normalize_city).collect();

        debug!("Got {} readings", readings.len());

        Ok(ReadingSet {
            fetched_at_ms: Utc::now().timestamp_millis(),
            readings,
        })
    }

    /// Fetch the forecast feed for the configured locations.
    pub async fn fetch_forecast(&self) -> Result<Vec<ForecastPoint>> {
        let url = format!("{}/forecast", self.base_url);

        debug!("Fetching forecast: {} ids={}", url, self.id_param());

        let resp = self
            .client
            .get(&url)
            .query(&[("id", self.id_param()), ("appid", self.api_key.clone())])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("forecast request failed: {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Gateway(format!(
                "forecast endpoint returned {}: {}",
                status,
                clip(&body)
            )));
        }

        let payload: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("forecast JSON parse error: {e}")))?;

        let Some(list) = payload.list else {
            return Err(Error::Gateway(
                "forecast response carried no list payload".into(),
            ));
        };

        Ok(list.into_iter().map(normalize_forecast).collect())
    }
}

/// First 500 chars of an error body, on a char boundary.
fn clip(body: &str) -> String {
    body.chars().take(500).collect()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn normalize_city(city: CityEntry) -> Reading {
    let (condition, description) = match city.weather.first() {
        Some(desc) => (desc.main, desc.description.clone()),
        None => (Condition::Other, String::new()),
    };

    Reading {
        id: city.id,
        name: city.name,
        condition,
        description,
        temp: finite(city.main.as_ref().and_then(|m| m.temp)),
        feels_like: finite(city.main.as_ref().and_then(|m| m.feels_like)),
        humidity: finite(city.main.as_ref().and_then(|m| m.humidity)),
        wind_speed: finite(city.wind.as_ref().and_then(|w| w.speed)),
    }
}

fn normalize_forecast(entry: ForecastEntry) -> ForecastPoint {
    let condition = entry
        .weather
        .first()
        .map(|d| d.main)
        .unwrap_or(Condition::Other);

    ForecastPoint {
        at: entry.dt_txt,
        condition,
        temp: finite(entry.main.as_ref().and_then(|m| m.temp)),
        humidity: finite(entry.main.as_ref().and_then(|m| m.humidity)),
        wind_speed: finite(entry.wind.as_ref().and_then(|w| w.speed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group_response() -> &'static str {
        r#"{
            "cnt": 2,
            "list": [
                {
                    "id": 1273294,
                    "name": "Delhi",
                    "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
                    "main": {"temp": 310.15, "feels_like": 312.0, "humidity": 40},
                    "wind": {"speed": 3.6}
                },
                {
                    "id": 1275339,
                    "name": "Mumbai",
                    "weather": [{"id": 721, "main": "Haze", "description": "haze"}],
                    "main": {"feels_like": 305.2, "humidity": 74},
                    "wind": {}
                }
            ]
        }"#
    }

    #[test]
    fn test_normalize_group_response() {
        let parsed: GroupResponse =
            serde_json::from_str(sample_group_response()).expect("response should deserialize");
        let readings: Vec<Reading> = parsed
            .list
            .expect("list present")
            .into_iter()
            .map(normalize_city)
            .collect();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].name, "Delhi");
        assert_eq!(readings[0].condition, Condition::Clear);
        assert_eq!(readings[0].temp, Some(310.15));
        assert_eq!(readings[0].humidity, Some(40.0));
        // Missing temp and wind speed normalize to None, not zero.
        assert_eq!(readings[1].temp, None);
        assert_eq!(readings[1].wind_speed, None);
        assert_eq!(readings[1].condition, Condition::Haze);
    }

    #[test]
    fn test_unknown_condition_collapses_to_other() {
        let raw = r#"{"id": 900, "main": "Sandstorm", "description": ""}"#;
        let desc: WeatherDesc = serde_json::from_str(raw).expect("should deserialize");
        assert_eq!(desc.main, Condition::Other);
    }

    mod http {
        use super::super::*;
        use common::config::LocationConfig;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn test_locations() -> Vec<LocationConfig> {
            vec![
                LocationConfig {
                    name: "Delhi".into(),
                    id: 1273294,
                },
                LocationConfig {
                    name: "Mumbai".into(),
                    id: 1275339,
                },
            ]
        }

        #[tokio::test]
        async fn fetch_current_normalizes_batch() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/group"))
                .and(query_param("id", "1273294,1275339"))
                .and(query_param("appid", "test-key"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_raw(super::sample_group_response(), "application/json"),
                )
                .mount(&server)
                .await;

            let client = OpenWeatherClient::with_base_url(
                server.uri(),
                "test-key".into(),
                test_locations(),
            );

            let set = client.fetch_current().await.expect("fetch should succeed");
            assert_eq!(set.readings.len(), 2);
            assert!(set.fetched_at_ms > 0);
        }

        #[tokio::test]
        async fn missing_list_is_a_gateway_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/group"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_raw(r#"{"cod": "200"}"#, "application/json"),
                )
                .mount(&server)
                .await;

            let client = OpenWeatherClient::with_base_url(
                server.uri(),
                "test-key".into(),
                test_locations(),
            );

            let err = client.fetch_current().await.expect_err("should fail");
            assert!(matches!(err, Error::Gateway(_)), "got {err:?}");
        }

        #[tokio::test]
        async fn error_status_is_a_gateway_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/group"))
                .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
                .mount(&server)
                .await;

            let client = OpenWeatherClient::with_base_url(
                server.uri(),
                "bad-key".into(),
                test_locations(),
            );

            let err = client.fetch_current().await.expect_err("should fail");
            assert!(matches!(err, Error::Gateway(_)), "got {err:?}");
        }

        #[tokio::test]
        async fn unreachable_host_is_a_transport_error() {
            // Nothing listens on port 1.
            let client = OpenWeatherClient::with_base_url(
                "http://127.0.0.1:1".into(),
                "test-key".into(),
                test_locations(),
            );

            let err = client.fetch_current().await.expect_err("should fail");
            assert!(matches!(err, Error::Transport(_)), "got {err:?}");
        }

        #[tokio::test]
        async fn fetch_forecast_normalizes_entries() {
            let server = MockServer::start().await;
            let body = r#"{
                "list": [
                    {
                        "dt_txt": "2026-08-07 12:00:00",
                        "main": {"temp": 303.15, "humidity": 60},
                        "wind": {"speed": 4.1},
                        "weather": [{"main": "Rain", "description": "light rain"}]
                    }
                ]
            }"#;
            Mock::given(method("GET"))
                .and(path("/forecast"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
                .mount(&server)
                .await;

            let client = OpenWeatherClient::with_base_url(
                server.uri(),
                "test-key".into(),
                test_locations(),
            );

            let points = client.fetch_forecast().await.expect("fetch should succeed");
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].at, "2026-08-07 12:00:00");
            assert_eq!(points[0].condition, Condition::Rain);
            assert_eq!(points[0].temp, Some(303.15));
        }
    }
}
