//! # Calculation Results
//!
//! The compute service answers `{"result": number, "error": null}` on success
//! and `{"result": null, "error": "..."}` on failure, whatever the HTTP
//! status. [`CalculationResult`] holds exactly one of the two.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::errors::{CalcError, CalcResult};

/// Outcome reported by the compute service. Never both a value and an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationResult {
    Value(f64),
    Error(String),
}

/// Raw response body as sent by the service.
///
/// `result` is kept as raw JSON text: integers wider than `f64` (large
/// factorials) are valid JSON but out of range for a direct `f64` decode.
#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<String>,
}

impl CalculationResult {
    /// Parse a response body.
    ///
    /// A non-empty `error` wins over `result`. A body that is not JSON, or
    /// carries neither field, is a transport error.
    pub fn from_body(body: &str) -> CalcResult<Self> {
        let response: ServiceResponse = serde_json::from_str(body)
            .map_err(|e| CalcError::transport(format!("unparseable response: {}", e)))?;

        match (response.error, response.result) {
            (Some(error), _) if !error.is_empty() => Ok(CalculationResult::Error(error)),
            (_, Some(raw)) => parse_number(raw.get()).map(CalculationResult::Value),
            _ => Err(CalcError::transport("response carried neither a result nor an error")),
        }
    }

    /// Convert into the numeric value, surfacing service errors as
    /// [`CalcError::Computation`] with the text unchanged.
    pub fn into_value(self) -> CalcResult<f64> {
        match self {
            CalculationResult::Value(value) => Ok(value),
            CalculationResult::Error(message) => Err(CalcError::computation(message)),
        }
    }

}

/// Decode a JSON number; magnitudes beyond `f64` become infinities.
fn parse_number(raw: &str) -> CalcResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CalcError::transport(format!("result is not a number: {}", raw)))
}
