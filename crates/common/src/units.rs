//! Temperature unit conversion.
//!
//! Display formatting is fixed at two decimals; a missing or non-finite
//! input renders as the literal string `NaN`, which is what the dashboard
//! shows for a dead sensor.

const KELVIN_OFFSET: f64 = 273.15;

/// Round to two decimals, the precision used for display and for
/// change comparison.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Kelvin to Celsius.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Kelvin to Fahrenheit.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    (kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0
}

/// Celsius value of a raw provider reading, rounded for display;
/// `None` for a missing or non-finite input.
pub fn celsius_reading(kelvin: Option<f64>) -> Option<f64> {
    kelvin
        .filter(|k| k.is_finite())
        .map(|k| round2(kelvin_to_celsius(k)))
}

/// Two-decimal Celsius string, or `"NaN"` when the input is unusable.
pub fn kelvin_to_celsius_string(kelvin: Option<f64>) -> String {
    match kelvin.filter(|k| k.is_finite()) {
        Some(k) => format!("{:.2}", kelvin_to_celsius(k)),
        None => "NaN".to_string(),
    }
}

/// Two-decimal Fahrenheit string, or `"NaN"` when the input is unusable.
pub fn kelvin_to_fahrenheit_string(kelvin: Option<f64>) -> String {
    match kelvin.filter(|k| k.is_finite()) {
        Some(k) => format!("{:.2}", kelvin_to_fahrenheit(k)),
        None => "NaN".to_string(),
    }
}
