//! # Result Formatting
//!
//! Numeric results are rounded to 10 decimal places before display to hide
//! floating-point noise (`0.1 + 0.2` shows as `0.3`). Text results pass
//! through untouched.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::format::{round_result, DisplayValue};
//!
//! assert_eq!(round_result(0.1 + 0.2), 0.3);
//! assert_eq!(DisplayValue::Number(8.0).formatted().to_string(), "8");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of decimal places kept by [`round_result`]
pub const DECIMAL_PLACES: usize = 10;

/// Round a finite value to the nearest [`DECIMAL_PLACES`]-place decimal.
///
/// Rounding goes through the exact decimal expansion rather than scaling by
/// `1e10`, so large magnitudes do not pick up an extra step in the last digit
/// and rounding an already rounded value is a no-op. Non-finite values come
/// back unchanged.
pub fn round_result(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", DECIMAL_PLACES, value)
        .parse()
        .unwrap_or(value)
}

/// Render a number the way the display field shows it.
///
/// Integral values print without a fractional part, `-0` prints as `0`
/// and infinities print as `Infinity` / `-Infinity`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    value.to_string()
}

/// A result as it is shown or stored: a number or a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl DisplayValue {
    /// Apply result rounding. Text is returned as-is.
    pub fn formatted(&self) -> DisplayValue {
        match self {
            DisplayValue::Number(value) => DisplayValue::Number(round_result(*value)),
            DisplayValue::Text(text) => DisplayValue::Text(text.clone()),
        }
    }

    /// Form written to storage. JSON has no infinities or NaN, so those are
    /// kept as their display text.
    pub fn storable(self) -> DisplayValue {
        match self {
            DisplayValue::Number(value) if !value.is_finite() => DisplayValue::Text(format_number(value)),
            other => other,
        }
    }
}

impl From<f64> for DisplayValue {
    fn from(value: f64) -> Self {
        DisplayValue::Number(value)
    }
}

impl From<String> for DisplayValue {
    fn from(text: String) -> Self {
        DisplayValue::Text(text)
    }
}

impl From<&str> for DisplayValue {
    fn from(text: &str) -> Self {
        DisplayValue::Text(text.to_string())
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(value) => write!(f, "{}", format_number(*value)),
            DisplayValue::Text(text) => write!(f, "{}", text),
        }
    }
}
