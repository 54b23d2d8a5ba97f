//! Server configuration from the environment.

use anyhow::{anyhow, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow!("DATABASE_URL is required (set in .env or environment)"))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow!("PORT must be a valid port number"))?,
            Err(_) => 5001,
        };

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("DATABASE_MAX_CONNECTIONS must be an integer"))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            port,
            max_connections,
        })
    }
}
