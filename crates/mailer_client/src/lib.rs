//! Client for the email-send endpoint.
//!
//! Alert delivery is best-effort: the controller logs failures and moves
//! on, so this client only reports what went wrong.

use common::{Error, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    subject: &'a str,
    text: &'a str,
}

/// Client for the outbound notification endpoint.
#[derive(Debug, Clone)]
pub struct MailerClient {
    client: reqwest::Client,
    base_url: String,
}

impl MailerClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build mailer HTTP client");

        Self { client, base_url }
    }

    /// Send one alert email.
    pub async fn send(&self, subject: &str, text: &str) -> Result<()> {
        let url = format!("{}/send-email", self.base_url);

        debug!("Sending alert email: {}", subject);

        let resp = self
            .client
            .post(&url)
            .json(&EmailRequest { subject, text })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("email request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Gateway(format!(
                "email endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(())
    }
}
