//! Gateway seams between the controller and its upstreams.
//!
//! The controller only sees these traits; production wiring plugs in the
//! HTTP clients, tests plug in scripted fakes.

use async_trait::async_trait;
use common::{DailySummary, ForecastPoint, ReadingSet, Result};

/// Remote weather provider.
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    async fn fetch_current(&self) -> Result<ReadingSet>;
    async fn fetch_forecast(&self) -> Result<Vec<ForecastPoint>>;
}

/// Summary persistence API.
#[async_trait]
pub trait SummaryGateway: Send + Sync {
    async fn save(&self, summary: &DailySummary) -> Result<()>;
    /// Stored summaries, newest date first.
    async fn list(&self) -> Result<Vec<DailySummary>>;
}

/// Outbound alert notifications.
#[async_trait]
pub trait AlertGateway: Send + Sync {
    async fn send(&self, subject: &str, text: &str) -> Result<()>;
}

#[async_trait]
impl WeatherGateway for openweather_client::OpenWeatherClient {
    async fn fetch_current(&self) -> Result<ReadingSet> {
        openweather_client::OpenWeatherClient::fetch_current(self).await
    }

    async fn fetch_forecast(&self) -> Result<Vec<ForecastPoint>> {
        openweather_client::OpenWeatherClient::fetch_forecast(self).await
    }
}

#[async_trait]
impl SummaryGateway for summary_client::SummaryClient {
    async fn save(&self, summary: &DailySummary) -> Result<()> {
        summary_client::SummaryClient::save(self, summary).await
    }

    async fn list(&self) -> Result<Vec<DailySummary>> {
        summary_client::SummaryClient::list(self).await
    }
}

#[async_trait]
impl AlertGateway for mailer_client::MailerClient {
    async fn send(&self, subject: &str, text: &str) -> Result<()> {
        mailer_client::MailerClient::send(self, subject, text).await
    }
}
