//! # Calculation Requests
//!
//! Types sent to the compute service. The JSON shape matches what the
//! service expects on `POST /calculate`:
//!
//! ```text
//! basic:      {"num1": 5.0, "operator": "+", "num2": 3.0}
//! scientific: {"function": "sin", "num": 30.0, "angleMode": "deg"}
//! constants:  {"function": "pi", "num": null, "angleMode": "deg"}
//! ```
//!
//! The service tells the two apart by the presence of `function`, so the
//! request enum is serialized untagged.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::request::{CalculationRequest, Operator};
//!
//! let request = CalculationRequest::basic(6.0, Operator::Multiply, 7.0);
//! assert_eq!(request.expression(), "6 × 7");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;
use crate::format::format_number;
use crate::symbols;

// ============================================================================
// Basic operators
// ============================================================================

/// Binary operator of a basic request. Serializes as the request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "**")]
    Power,
    #[serde(rename = "%")]
    Modulo,
}

impl Operator {
    /// All operators in the order the basic panel lists them
    pub const ALL: [Operator; 6] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Power,
        Operator::Modulo,
    ];

    /// Request-level token (`*`, `/`, `**`, ...)
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "**",
            Operator::Modulo => "%",
        }
    }

    /// Glyph shown to the user (`×`, `÷`, `^`, ...)
    pub fn glyph(&self) -> &'static str {
        symbols::glyph_for(*self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    /// Accepts request tokens and display glyphs alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Operator::ALL
            .into_iter()
            .find(|op| op.token() == s)
            .or_else(|| symbols::operator_for_glyph(s))
            .ok_or_else(|| CalcError::validation(format!("Unknown operator: {}", s)))
    }
}

// ============================================================================
// Scientific functions
// ============================================================================

/// Named function of a scientific request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScientificFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Log10,
    Ln,
    Sqrt,
    Cbrt,
    Square,
    Cube,
    Reciprocal,
    Factorial,
    Abs,
    Negate,
    Pi,
    E,
}

impl ScientificFunction {
    pub const ALL: [ScientificFunction; 21] = [
        ScientificFunction::Sin,
        ScientificFunction::Cos,
        ScientificFunction::Tan,
        ScientificFunction::Asin,
        ScientificFunction::Acos,
        ScientificFunction::Atan,
        ScientificFunction::Sinh,
        ScientificFunction::Cosh,
        ScientificFunction::Tanh,
        ScientificFunction::Log10,
        ScientificFunction::Ln,
        ScientificFunction::Sqrt,
        ScientificFunction::Cbrt,
        ScientificFunction::Square,
        ScientificFunction::Cube,
        ScientificFunction::Reciprocal,
        ScientificFunction::Factorial,
        ScientificFunction::Abs,
        ScientificFunction::Negate,
        ScientificFunction::Pi,
        ScientificFunction::E,
    ];

    /// Wire name of the function
    pub fn name(&self) -> &'static str {
        match self {
            ScientificFunction::Sin => "sin",
            ScientificFunction::Cos => "cos",
            ScientificFunction::Tan => "tan",
            ScientificFunction::Asin => "asin",
            ScientificFunction::Acos => "acos",
            ScientificFunction::Atan => "atan",
            ScientificFunction::Sinh => "sinh",
            ScientificFunction::Cosh => "cosh",
            ScientificFunction::Tanh => "tanh",
            ScientificFunction::Log10 => "log10",
            ScientificFunction::Ln => "ln",
            ScientificFunction::Sqrt => "sqrt",
            ScientificFunction::Cbrt => "cbrt",
            ScientificFunction::Square => "square",
            ScientificFunction::Cube => "cube",
            ScientificFunction::Reciprocal => "reciprocal",
            ScientificFunction::Factorial => "factorial",
            ScientificFunction::Abs => "abs",
            ScientificFunction::Negate => "negate",
            ScientificFunction::Pi => "pi",
            ScientificFunction::E => "e",
        }
    }

    /// Constants take no operand
    pub fn is_constant(&self) -> bool {
        matches!(self, ScientificFunction::Pi | ScientificFunction::E)
    }
}

impl fmt::Display for ScientificFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScientificFunction {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        ScientificFunction::ALL
            .into_iter()
            .find(|func| func.name() == name)
            .ok_or_else(|| CalcError::validation(format!("Unknown function: {}", s.trim())))
    }
}

// ============================================================================
// Angle mode
// ============================================================================

/// Angle unit for trigonometric functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    #[default]
    Deg,
    Rad,
}

impl AngleMode {
    /// Label shown next to the scientific operand
    pub fn label(&self) -> &'static str {
        match self {
            AngleMode::Deg => "°",
            AngleMode::Rad => "rad",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AngleMode::Deg => AngleMode::Rad,
            AngleMode::Rad => AngleMode::Deg,
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleMode::Deg => write!(f, "deg"),
            AngleMode::Rad => write!(f, "rad"),
        }
    }
}

impl FromStr for AngleMode {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deg" | "degrees" => Ok(AngleMode::Deg),
            "rad" | "radians" => Ok(AngleMode::Rad),
            other => Err(CalcError::validation(format!(
                "Unknown angle mode: '{}'. Valid options: deg, rad",
                other
            ))),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// A validated request, ready to be sent to the compute service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationRequest {
    Basic {
        num1: f64,
        operator: Operator,
        num2: f64,
    },
    Scientific {
        function: ScientificFunction,
        /// `None` only for constants
        num: Option<f64>,
        #[serde(rename = "angleMode")]
        angle_mode: AngleMode,
    },
}

impl CalculationRequest {
    pub fn basic(num1: f64, operator: Operator, num2: f64) -> Self {
        CalculationRequest::Basic { num1, operator, num2 }
    }

    /// Build a scientific request. The operand is dropped for constants.
    pub fn scientific(function: ScientificFunction, num: Option<f64>, angle_mode: AngleMode) -> Self {
        let num = if function.is_constant() { None } else { num };
        CalculationRequest::Scientific {
            function,
            num,
            angle_mode,
        }
    }

    /// Expression text as it appears in the history list.
    ///
    /// Basic requests use display glyphs (`6 × 7`), scientific ones use
    /// call syntax (`sin(30)`, `pi(null)`).
    pub fn expression(&self) -> String {
        match self {
            CalculationRequest::Basic { num1, operator, num2 } => format!(
                "{} {} {}",
                format_number(*num1),
                operator.glyph(),
                format_number(*num2)
            ),
            CalculationRequest::Scientific { function, num, .. } => {
                let arg = num.map(format_number).unwrap_or_else(|| "null".to_string());
                format!("{}({})", function.name(), arg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_wire_shape() {
        let request = CalculationRequest::basic(5.0, Operator::Power, 2.0);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"num1": 5.0, "operator": "**", "num2": 2.0}));
    }

    #[test]
    fn test_scientific_wire_shape() {
        let request = CalculationRequest::scientific(ScientificFunction::Sin, Some(30.0), AngleMode::Rad);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"function": "sin", "num": 30.0, "angleMode": "rad"}));
    }

    #[test]
    fn test_constant_sends_null_operand() {
        let request = CalculationRequest::scientific(ScientificFunction::Pi, Some(4.0), AngleMode::Deg);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["num"], serde_json::Value::Null);
        assert_eq!(value["function"], "pi");
    }

    #[test]
    fn test_log10_wire_name() {
        let value = serde_json::to_value(ScientificFunction::Log10).unwrap();
        assert_eq!(value, json!("log10"));
    }

    #[test]
    fn test_expressions() {
        assert_eq!(CalculationRequest::basic(5.0, Operator::Add, 3.0).expression(), "5 + 3");
        assert_eq!(CalculationRequest::basic(2.5, Operator::Divide, 4.0).expression(), "2.5 ÷ 4");
        assert_eq!(
            CalculationRequest::scientific(ScientificFunction::Sin, Some(30.0), AngleMode::Deg).expression(),
            "sin(30)"
        );
        assert_eq!(
            CalculationRequest::scientific(ScientificFunction::E, None, AngleMode::Deg).expression(),
            "e(null)"
        );
    }

    #[test]
    fn test_operator_parsing_accepts_tokens_and_glyphs() {
        assert_eq!("**".parse::<Operator>().unwrap(), Operator::Power);
        assert_eq!("^".parse::<Operator>().unwrap(), Operator::Power);
        assert_eq!("×".parse::<Operator>().unwrap(), Operator::Multiply);
        assert!("?".parse::<Operator>().is_err());
    }

    #[test]
    fn test_function_parsing() {
        assert_eq!("SQRT".parse::<ScientificFunction>().unwrap(), ScientificFunction::Sqrt);
        assert!("log".parse::<ScientificFunction>().is_err());
        assert!(ScientificFunction::Pi.is_constant());
        assert!(!ScientificFunction::Sinh.is_constant());
    }

    #[test]
    fn test_angle_mode() {
        assert_eq!(AngleMode::default(), AngleMode::Deg);
        assert_eq!(AngleMode::Deg.toggled(), AngleMode::Rad);
        assert_eq!(AngleMode::Rad.label(), "rad");
        assert_eq!("radians".parse::<AngleMode>().unwrap(), AngleMode::Rad);
    }
}
