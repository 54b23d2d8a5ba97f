//! Client for the daily-summary API.
//!
//! Failures split three ways so the surfaced message tells the user what
//! actually happened: the store answered with an error status, the request
//! went out but nothing came back, or the request never left.

use common::{DailySummary, Error, PersistenceError, Result};
use tracing::debug;

/// REST client for the summary store.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl SummaryClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build summary HTTP client");

        Self { client, base_url }
    }

    /// Persist one daily summary.
    pub async fn save(&self, summary: &DailySummary) -> Result<()> {
        let url = format!("{}/summaries", self.base_url);

        debug!("Saving daily summary for {}", summary.date);

        let resp = self
            .client
            .post(&url)
            .json(summary)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(())
    }

    /// All stored summaries, newest date first (server-side ordering).
    pub async fn list(&self) -> Result<Vec<DailySummary>> {
        let url = format!("{}/summaries", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let summaries: Vec<DailySummary> = resp
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("summary list parse error: {e}")))?;

        debug!("Fetched {} stored summaries", summaries.len());

        Ok(summaries)
    }
}

/// Requests that failed before a response arrived: builder problems mean
/// the request never left, everything else is a dead wire.
fn classify_send_error(e: reqwest::Error) -> Error {
    if e.is_builder() {
        PersistenceError::Send(e.to_string()).into()
    } else {
        PersistenceError::NoResponse(e.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Condition;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_summary() -> DailySummary {
        DailySummary {
            avg_temp: 31.42,
            max_temp: 37.0,
            min_temp: 26.85,
            avg_humidity: 45.5,
            avg_wind_speed: 3.6,
            dominant_condition: Condition::Clear,
            date: "2026-08-07".into(),
        }
    }

    #[tokio::test]
    async fn save_posts_wire_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summaries"))
            .and(body_json(serde_json::json!({
                "avgTemp": 31.42,
                "maxTemp": 37.0,
                "minTemp": 26.85,
                "avgHumidity": 45.5,
                "avgWindSpeed": 3.6,
                "dominantCondition": "Clear",
                "date": "2026-08-07"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = SummaryClient::new(server.uri());
        client.save(&sample_summary()).await.expect("save should succeed");
    }

    #[tokio::test]
    async fn error_status_is_reported_as_status_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summaries"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Missing required fields"))
            .mount(&server)
            .await;

        let client = SummaryClient::new(server.uri());
        let err = client.save(&sample_summary()).await.expect_err("should fail");
        match err {
            Error::Persistence(PersistenceError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing required fields");
            }
            other => panic!("expected status failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dead_endpoint_is_reported_as_no_response() {
        // Nothing listens on port 1.
        let client = SummaryClient::new("http://127.0.0.1:1".into());
        let err = client.save(&sample_summary()).await.expect_err("should fail");
        assert!(
            matches!(err, Error::Persistence(PersistenceError::NoResponse(_))),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn list_preserves_server_ordering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summaries"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[
                    {"id": "2b3c", "avgTemp": 30.0, "maxTemp": 35.0, "minTemp": 25.0,
                     "avgHumidity": 50.0, "avgWindSpeed": 2.0,
                     "dominantCondition": "Rain", "date": "2026-08-07"},
                    {"id": "1a2b", "avgTemp": 28.0, "maxTemp": 33.0, "minTemp": 24.0,
                     "avgHumidity": 55.0, "avgWindSpeed": 1.5,
                     "dominantCondition": "Clouds", "date": "2026-08-06"}
                ]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = SummaryClient::new(server.uri());
        let summaries = client.list().await.expect("list should succeed");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].date, "2026-08-07");
        assert_eq!(summaries[1].dominant_condition, Condition::Clouds);
    }
}
