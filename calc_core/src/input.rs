//! # Input Panels
//!
//! Raw text of the basic and scientific panels, and the validation that
//! turns it into a [`CalculationRequest`]. Validation failures never reach
//! the compute service.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::format::format_number;
use crate::replay::BasicOperands;
use crate::request::{AngleMode, CalculationRequest, Operator, ScientificFunction};

/// Two operands and an operator, as typed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicPanel {
    pub num1: String,
    pub operator: Operator,
    pub num2: String,
}

impl BasicPanel {
    /// Display preview, e.g. `5 × 0` while the second operand is empty
    pub fn display_text(&self) -> String {
        format!(
            "{} {} {}",
            or_zero(&self.num1),
            self.operator.glyph(),
            or_zero(&self.num2)
        )
    }

    /// Validate the panel into a request
    pub fn to_request(&self) -> CalcResult<CalculationRequest> {
        if self.num1.trim().is_empty() || self.num2.trim().is_empty() {
            return Err(CalcError::validation("Please enter both numbers"));
        }

        match (parse_operand(&self.num1), parse_operand(&self.num2)) {
            (Some(num1), Some(num2)) => Ok(CalculationRequest::basic(num1, self.operator, num2)),
            _ => Err(CalcError::validation("Please enter valid numbers")),
        }
    }

    /// Fill from a replayed expression
    pub fn fill(&mut self, operands: BasicOperands) {
        self.num1 = format_number(operands.num1);
        self.operator = operands.operator;
        self.num2 = format_number(operands.num2);
    }

    /// Empty both operands and reset the operator to addition
    pub fn clear(&mut self) {
        *self = BasicPanel::default();
    }
}

/// Single operand of the scientific panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScientificPanel {
    pub num: String,
}

impl ScientificPanel {
    /// Display preview, e.g. `30 °` or `1.5 rad`
    pub fn display_text(&self, angle_mode: AngleMode) -> String {
        format!("{} {}", or_zero(&self.num), angle_mode.label())
    }

    /// Validate the panel into a request for `function`.
    ///
    /// Constants ignore the operand field entirely.
    pub fn to_request(&self, function: ScientificFunction, angle_mode: AngleMode) -> CalcResult<CalculationRequest> {
        if function.is_constant() {
            return Ok(CalculationRequest::scientific(function, None, angle_mode));
        }

        if self.num.trim().is_empty() {
            return Err(CalcError::validation("Please enter a number"));
        }

        let num = parse_operand(&self.num).ok_or_else(|| CalcError::validation("Please enter a valid number"))?;
        Ok(CalculationRequest::scientific(function, Some(num), angle_mode))
    }

    pub fn fill(&mut self, num: f64) {
        self.num = format_number(num);
    }

    pub fn clear(&mut self) {
        self.num.clear();
    }
}

/// Parse a typed operand. Only finite numbers are accepted.
pub fn parse_operand(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn or_zero(text: &str) -> &str {
    if text.is_empty() {
        "0"
    } else {
        text
    }
}
