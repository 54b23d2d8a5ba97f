//! Summary persistence.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewSummary, StoredSummary};

/// Storage seam for the summary collection. Append-only from the API's
/// perspective: no update, delete, or uniqueness constraint — duplicate
/// dates are legal and both records are retained.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn insert(&self, summary: NewSummary) -> Result<StoredSummary>;

    /// All records, newest date first.
    async fn list(&self) -> Result<Vec<StoredSummary>>;
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgSummaryStore {
    pool: PgPool,
}

impl PgSummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn insert(&self, summary: NewSummary) -> Result<StoredSummary> {
        let record = sqlx::query_as::<_, StoredSummary>(
            r#"
            INSERT INTO daily_summaries
                (id, avg_temp, max_temp, min_temp, avg_wind_speed, avg_humidity,
                 dominant_condition, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(summary.avg_temp)
        .bind(summary.max_temp)
        .bind(summary.min_temp)
        .bind(summary.avg_wind_speed)
        .bind(summary.avg_humidity)
        .bind(&summary.dominant_condition)
        .bind(&summary.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<StoredSummary>> {
        let records = sqlx::query_as::<_, StoredSummary>(
            "SELECT * FROM daily_summaries ORDER BY date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// In-memory store backing the handler tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryStore {
    records: std::sync::Mutex<Vec<StoredSummary>>,
}

#[cfg(test)]
#[async_trait]
impl SummaryStore for InMemoryStore {
    async fn insert(&self, summary: NewSummary) -> Result<StoredSummary> {
        let record = StoredSummary {
            id: Uuid::new_v4(),
            avg_temp: summary.avg_temp,
            max_temp: summary.max_temp,
            min_temp: summary.min_temp,
            avg_wind_speed: summary.avg_wind_speed,
            avg_humidity: summary.avg_humidity,
            dominant_condition: summary.dominant_condition,
            date: summary.date,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<StoredSummary>> {
        let mut records = self.records.lock().unwrap().clone();
        // Stable sort keeps duplicate dates in insertion order, matching
        // the SQL ordering.
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}
