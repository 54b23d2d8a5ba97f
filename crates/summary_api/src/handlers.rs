//! HTTP handlers for the summary endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::models::{NewSummary, StoredSummary};
use crate::store::SummaryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SummaryStore>,
}

/// POST /summaries
///
/// 201 with the stored record, 400 on missing/non-numeric fields,
/// 500 when the store is unavailable.
pub async fn create_summary(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<StoredSummary>)> {
    let summary = NewSummary::from_body(&body)?;
    let stored = state.store.insert(summary).await?;

    info!(date = %stored.date, "daily summary saved");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /summaries
///
/// 200 with all records ordered by date descending, 500 on store failure.
pub async fn list_summaries(State(state): State<AppState>) -> Result<Json<Vec<StoredSummary>>> {
    let summaries = state.store.list().await?;
    Ok(Json(summaries))
}
