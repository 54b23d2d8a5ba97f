//! Pure computations over a reading batch: unit conversion, change
//! detection, the daily aggregate, and the alert predicate.

use common::units;
use common::{Condition, DailySummary, ForecastPoint, Reading, ReadingSet};

/// Rewrite a fetched set's temperature fields from Kelvin to display
/// units (°C, 2-decimal precision).
pub fn convert_readings(set: ReadingSet) -> ReadingSet {
    ReadingSet {
        fetched_at_ms: set.fetched_at_ms,
        readings: set
            .readings
            .into_iter()
            .map(|mut r| {
                r.temp = units::celsius_reading(r.temp);
                r.feels_like = units::celsius_reading(r.feels_like);
                r
            })
            .collect(),
    }
}

/// Same conversion for forecast steps.
pub fn convert_forecast(points: Vec<ForecastPoint>) -> Vec<ForecastPoint> {
    points
        .into_iter()
        .map(|mut p| {
            p.temp = units::celsius_reading(p.temp);
            p
        })
        .collect()
}

/// True when the fresh batch differs from the cached one: a different
/// reading count, or any per-index temperature change — no tolerance.
/// Two missing temperatures compare equal, so a dead sensor does not
/// retrigger aggregation every cycle.
pub fn is_significant_change(new: &[Reading], old: &[Reading]) -> bool {
    if new.len() != old.len() {
        return true;
    }
    new.iter().zip(old).any(|(n, o)| n.temp != o.temp)
}

/// Most frequent condition across the whole batch. Readings filtered out
/// of the numeric aggregates still count here; a tie goes to the
/// condition encountered first.
pub fn dominant_condition(readings: &[Reading]) -> Option<Condition> {
    let mut counts: Vec<(Condition, usize)> = Vec::new();
    for r in readings {
        match counts.iter_mut().find(|(c, _)| *c == r.condition) {
            Some((_, n)) => *n += 1,
            None => counts.push((r.condition, 1)),
        }
    }

    let mut best: Option<(Condition, usize)> = None;
    for (condition, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((condition, count)),
        }
    }
    best.map(|(condition, _)| condition)
}

fn finite_values<'a>(
    readings: &'a [Reading],
    field: impl Fn(&Reading) -> Option<f64> + 'a,
) -> Vec<f64> {
    readings
        .iter()
        .filter_map(field)
        .filter(|v| v.is_finite())
        .collect()
}

/// Arithmetic mean; an empty input yields NaN, which the summary store
/// rejects downstream — the same fate the source system gave it.
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute the daily aggregate for a batch.
///
/// Returns `None` when the batch is empty or no reading carries a usable
/// temperature. Humidity and wind filter independently — a reading with a
/// missing humidity still contributes its temperature.
pub fn daily_summary(readings: &[Reading], date: &str) -> Option<DailySummary> {
    if readings.is_empty() {
        return None;
    }

    let temps = finite_values(readings, |r| r.temp);
    if temps.is_empty() {
        return None;
    }

    let humidity = finite_values(readings, |r| r.humidity);
    let wind = finite_values(readings, |r| r.wind_speed);

    let dominant = dominant_condition(readings)?;

    Some(DailySummary {
        avg_temp: units::round2(mean(&temps)),
        max_temp: units::round2(temps.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        min_temp: units::round2(temps.iter().copied().fold(f64::INFINITY, f64::min)),
        avg_humidity: units::round2(mean(&humidity)),
        avg_wind_speed: units::round2(mean(&wind)),
        dominant_condition: dominant,
        date: date.to_string(),
    })
}

/// Warning message when the last two readings (by batch position) both
/// exceed the threshold; `None` clears any standing alert.
pub fn alert_message(readings: &[Reading], threshold_c: f64) -> Option<String> {
    if readings.is_empty() {
        return None;
    }

    let tail = &readings[readings.len().saturating_sub(2)..];
    let all_above = tail
        .iter()
        .all(|r| r.temp.map_or(false, |t| t > threshold_c));

    all_above.then(|| {
        format!("Temperature exceeded {threshold_c}°C for two consecutive updates!")
    })
}
