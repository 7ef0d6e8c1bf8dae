//! Operator glyph table.
//!
//! The history list shows `×`, `÷` and `^` while the service expects `*`,
//! `/` and `**`. One table drives both directions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::request::Operator;

/// Operator ↔ display glyph
const GLYPHS: [(Operator, &str); 6] = [
    (Operator::Add, "+"),
    (Operator::Subtract, "-"),
    (Operator::Multiply, "×"),
    (Operator::Divide, "÷"),
    (Operator::Power, "^"),
    (Operator::Modulo, "%"),
];

static BY_GLYPH: Lazy<HashMap<&'static str, Operator>> =
    Lazy::new(|| GLYPHS.iter().map(|(op, glyph)| (*glyph, *op)).collect());

/// Display glyph for an operator
pub fn glyph_for(operator: Operator) -> &'static str {
    GLYPHS
        .iter()
        .find(|(op, _)| *op == operator)
        .map(|(_, glyph)| *glyph)
        .unwrap_or("+")
}

/// Operator for a display glyph, if the glyph is known
pub fn operator_for_glyph(glyph: &str) -> Option<Operator> {
    BY_GLYPH.get(glyph).copied()
}
