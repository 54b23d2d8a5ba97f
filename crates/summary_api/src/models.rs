//! Wire models and field coercion for the summary endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// A validated summary ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSummary {
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_wind_speed: f64,
    pub avg_humidity: f64,
    pub dominant_condition: String,
    pub date: String,
}

/// A stored record as returned by `GET /summaries`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredSummary {
    pub id: Uuid,
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_wind_speed: f64,
    pub avg_humidity: f64,
    pub dominant_condition: String,
    pub date: String,
}

fn missing(name: &str) -> ApiError {
    ApiError::Validation(format!("missing required field '{name}'"))
}

/// Pull a numeric field, accepting JSON numbers or numeric strings.
fn numeric_field(body: &Value, name: &str) -> Result<f64, ApiError> {
    let value = body.get(name).ok_or_else(|| missing(name))?;

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ApiError::Validation(format!(
            "field '{name}' must be numeric"
        ))),
    }
}

fn string_field(body: &Value, name: &str) -> Result<String, ApiError> {
    match body.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(ApiError::Validation(format!(
            "field '{name}' must be a non-empty string"
        ))),
        None => Err(missing(name)),
    }
}

impl NewSummary {
    /// Validate and coerce a request body. All seven fields must be
    /// present; numeric fields accept numbers or numeric strings.
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        Ok(Self {
            avg_temp: numeric_field(body, "avgTemp")?,
            max_temp: numeric_field(body, "maxTemp")?,
            min_temp: numeric_field(body, "minTemp")?,
            avg_wind_speed: numeric_field(body, "avgWindSpeed")?,
            avg_humidity: numeric_field(body, "avgHumidity")?,
            dominant_condition: string_field(body, "dominantCondition")?,
            date: string_field(body, "date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> Value {
        json!({
            "avgTemp": 31.42,
            "maxTemp": 37.0,
            "minTemp": 26.85,
            "avgWindSpeed": 3.6,
            "avgHumidity": 45.5,
            "dominantCondition": "Clear",
            "date": "2026-08-07"
        })
    }

    #[test]
    fn test_accepts_plain_numbers() {
        let summary = NewSummary::from_body(&full_body()).expect("valid body");
        assert_eq!(summary.avg_temp, 31.42);
        assert_eq!(summary.dominant_condition, "Clear");
    }

    #[test]
    fn test_coerces_numeric_strings() {
        let mut body = full_body();
        body["avgHumidity"] = json!("45.5");
        body["avgWindSpeed"] = json!(" 3.6 ");

        let summary = NewSummary::from_body(&body).expect("valid body");
        assert_eq!(summary.avg_humidity, 45.5);
        assert_eq!(summary.avg_wind_speed, 3.6);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut body = full_body();
        body.as_object_mut()
            .expect("object")
            .remove("dominantCondition");

        let err = NewSummary::from_body(&body).expect_err("should fail");
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.to_string().contains("dominantCondition"));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let mut body = full_body();
        body["avgHumidity"] = json!("damp");

        let err = NewSummary::from_body(&body).expect_err("should fail");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_null_field_is_rejected() {
        let mut body = full_body();
        body["avgTemp"] = Value::Null;

        let err = NewSummary::from_body(&body).expect_err("should fail");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
