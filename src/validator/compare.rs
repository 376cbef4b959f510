//! Field-level comparison operations.
//!
//! Comparisons are numeric-aware: floating-point values are equal when
//! they agree within [`FLOAT_TOLERANCE`], whatever their spelling, while
//! integer values compare exactly. Values read from XML documents arrive
//! as text and coerce against the expectation's type before comparing.

use super::ValidationError;
use crate::document::{self, ContentKind, DocumentEditor, FieldKind, JsonEditor};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Absolute tolerance for floating-point equality.
pub const FLOAT_TOLERANCE: f64 = 1e-4;

/// How a field's actual value relates to the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Values must be equal (numeric tolerance applies).
    Equal,
    /// Values must differ.
    NotEqual,
    /// The value must be an array containing the expectation.
    HasItem,
    /// The value must be an array not containing the expectation.
    NotHasItem,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equal => "equal",
            CompareOp::NotEqual => "notEqual",
            CompareOp::HasItem => "hasItem",
            CompareOp::NotHasItem => "notHasItem",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" | "equals" => Ok(CompareOp::Equal),
            "notequal" | "not_equal" => Ok(CompareOp::NotEqual),
            "hasitem" | "has_item" => Ok(CompareOp::HasItem),
            "nothasitem" | "not_has_item" => Ok(CompareOp::NotHasItem),
            _ => Err(ValidationError::UnknownOp(s.to_string())),
        }
    }
}

/// Structural equality with numeric tolerance at the leaves.
///
/// The tolerance applies only when a float is involved; integer pairs
/// compare exactly, even past f64 precision.
pub fn values_equal(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            if a.is_f64() || b.is_f64() {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => (x - y).abs() <= FLOAT_TOLERANCE,
                    _ => false,
                }
            } else {
                a == b
            }
        }
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| {
                    b.get(key).map(|y| values_equal(x, y)).unwrap_or(false)
                })
        }
        _ => left == right,
    }
}

/// Equality after coercing a textual actual toward the expectation.
///
/// XML reads produce strings; an expectation of `42` should still match
/// an element holding `"42"`. An integer expectation coerces the text as
/// an integer first, keeping the comparison exact.
pub fn values_match(actual: &JsonValue, expected: &JsonValue) -> bool {
    if values_equal(actual, expected) {
        return true;
    }
    match (actual, expected) {
        (JsonValue::String(text), JsonValue::Number(n)) => {
            let raw = text.trim();
            if !n.is_f64() {
                if let Ok(v) = raw.parse::<i64>() {
                    return n.as_i64() == Some(v);
                }
                if let Ok(v) = raw.parse::<u64>() {
                    return n.as_u64() == Some(v);
                }
            }
            match (raw.parse::<f64>(), n.as_f64()) {
                (Ok(x), Some(y)) => (x - y).abs() <= FLOAT_TOLERANCE,
                _ => false,
            }
        }
        (JsonValue::String(text), JsonValue::Bool(b)) => {
            text.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        _ => false,
    }
}

/// Reads the value at `path` in a form suitable for comparison.
///
/// JSON documents yield the node itself; XML documents yield the element
/// text as a string.
fn value_at(doc: &str, path: &str) -> Result<JsonValue, ValidationError> {
    match ContentKind::sniff(doc) {
        ContentKind::Json => {
            let field = JsonEditor::new().read_typed(doc, path, FieldKind::Node)?;
            Ok(field.to_json())
        }
        ContentKind::Xml => Ok(JsonValue::String(document::read(doc, path)?)),
        ContentKind::Unknown => Err(ValidationError::Document(
            crate::document::DocumentError::UnrecognizedContent,
        )),
    }
}

fn render_plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn contains_item(path: &str, actual: &JsonValue, expected: &JsonValue) -> Result<bool, ValidationError> {
    match actual {
        JsonValue::Array(items) => Ok(items.iter().any(|item| values_match(item, expected))),
        _ => Err(ValidationError::Failed {
            path: path.to_string(),
            message: format!("Expected an array but got {}", render_plain(actual)),
        }),
    }
}

/// Asserts one field of a document against an expectation.
///
/// # Arguments
///
/// * `doc` - JSON or XML document text
/// * `path` - Path to the field under test
/// * `op` - How the actual value must relate to the expectation
/// * `expected` - The expectation
///
/// # Returns
///
/// `Ok(())` when the assertion holds, otherwise a [`ValidationError`]
/// describing the failure.
pub fn assert_field(
    doc: &str,
    path: &str,
    op: CompareOp,
    expected: &JsonValue,
) -> Result<(), ValidationError> {
    let actual = value_at(doc, path)?;

    let failure = |message: String| ValidationError::Failed {
        path: path.to_string(),
        message,
    };

    match op {
        CompareOp::Equal => {
            if values_match(&actual, expected) {
                Ok(())
            } else {
                Err(failure(format!(
                    "Expected {} but got {}",
                    render_plain(expected),
                    render_plain(&actual)
                )))
            }
        }
        CompareOp::NotEqual => {
            if !values_match(&actual, expected) {
                Ok(())
            } else {
                Err(failure(format!(
                    "Expected a value different from {}",
                    render_plain(expected)
                )))
            }
        }
        CompareOp::HasItem => {
            if contains_item(path, &actual, expected)? {
                Ok(())
            } else {
                Err(failure(format!(
                    "Expected array to contain {}",
                    render_plain(expected)
                )))
            }
        }
        CompareOp::NotHasItem => {
            if !contains_item(path, &actual, expected)? {
                Ok(())
            } else {
                Err(failure(format!(
                    "Expected array not to contain {}",
                    render_plain(expected)
                )))
            }
        }
    }
}
