//! # History Replay
//!
//! Turns a stored expression back into panel inputs. Scientific entries are
//! stored as `name(arg)`, basic ones as `operand glyph operand`.
//!
//! ```rust
//! use calc_core::replay::{parse_expression, Replay};
//! use calc_core::request::Operator;
//!
//! match parse_expression("6 × 7") {
//!     Replay::Basic(Some(ops)) => assert_eq!(ops.operator, Operator::Multiply),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::parse_operand;
use crate::request::{Operator, ScientificFunction};
use crate::symbols;

static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\((.*?)\)").expect("function call pattern is valid"));

/// Operands recovered from a basic expression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicOperands {
    pub num1: f64,
    pub operator: Operator,
    pub num2: f64,
}

/// What replaying an expression does to the panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Replay {
    /// Switch to the basic tab; fill the inputs when the expression parsed.
    Basic(Option<BasicOperands>),
    /// Switch to the scientific tab and put `num` in the operand field.
    Scientific {
        function: Option<ScientificFunction>,
        num: f64,
    },
}

/// Parse a history expression.
///
/// A `name(arg)` call is scientific; a non-numeric argument (`pi(null)`)
/// replays as `0`. Anything else is split on spaces into
/// `operand operator operand`, with display glyphs mapped back to
/// operators and unknown glyphs falling back to addition.
pub fn parse_expression(expression: &str) -> Replay {
    if let Some(caps) = FUNCTION_CALL.captures(expression) {
        let function = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let num = caps
            .get(2)
            .and_then(|m| parse_operand(m.as_str()))
            .unwrap_or(0.0);
        return Replay::Scientific { function, num };
    }

    Replay::Basic(parse_basic(expression))
}

fn parse_basic(expression: &str) -> Option<BasicOperands> {
    let parts: Vec<&str> = expression.split(' ').collect();
    if parts.len() < 3 {
        return None;
    }

    let num1 = parse_operand(parts[0])?;
    let operator = symbols::operator_for_glyph(parts[1]).unwrap_or(Operator::Add);
    let num2 = parse_operand(&parts[2..].concat())?;

    Some(BasicOperands { num1, operator, num2 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_addition() {
        assert_eq!(
            parse_expression("5 + 3"),
            Replay::Basic(Some(BasicOperands {
                num1: 5.0,
                operator: Operator::Add,
                num2: 3.0
            }))
        );
    }

    #[test]
    fn test_glyphs_translate_back() {
        let cases = [("6 × 7", Operator::Multiply), ("8 ÷ 2", Operator::Divide), ("2 ^ 10", Operator::Power)];
        for (expression, expected) in cases {
            match parse_expression(expression) {
                Replay::Basic(Some(ops)) => assert_eq!(ops.operator, expected, "{}", expression),
                other => panic!("{} parsed as {:?}", expression, other),
            }
        }
    }

    #[test]
    fn test_negative_operands() {
        assert_eq!(
            parse_expression("-5 - -2.5"),
            Replay::Basic(Some(BasicOperands {
                num1: -5.0,
                operator: Operator::Subtract,
                num2: -2.5
            }))
        );
    }

    #[test]
    fn test_unknown_glyph_falls_back_to_addition() {
        match parse_expression("1 ? 2") {
            Replay::Basic(Some(ops)) => assert_eq!(ops.operator, Operator::Add),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_basic() {
        assert_eq!(parse_expression("5 +"), Replay::Basic(None));
        assert_eq!(parse_expression("five + 3"), Replay::Basic(None));
    }

    #[test]
    fn test_scientific_call() {
        assert_eq!(
            parse_expression("sin(30)"),
            Replay::Scientific {
                function: Some(ScientificFunction::Sin),
                num: 30.0
            }
        );
    }

    #[test]
    fn test_constant_replays_as_zero() {
        assert_eq!(
            parse_expression("pi(null)"),
            Replay::Scientific {
                function: Some(ScientificFunction::Pi),
                num: 0.0
            }
        );
    }

    #[test]
    fn test_unknown_function_still_scientific() {
        assert_eq!(
            parse_expression("foo(2.5)"),
            Replay::Scientific { function: None, num: 2.5 }
        );
    }
}
