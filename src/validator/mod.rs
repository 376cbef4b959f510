//! Response validation.
//!
//! Assertions a test makes about a response: status checks, single-field
//! comparisons under a [`CompareOp`], and whole-body diffs producing a
//! line-per-divergence report. Numeric comparisons everywhere share the
//! same absolute tolerance.

pub mod compare;
pub mod diff;

pub use compare::{assert_field, values_equal, values_match, CompareOp, FLOAT_TOLERANCE};
pub use diff::{diff_documents, DiffEntry, DiffReport};

use crate::document::DocumentError;
use crate::models::ApiResponse;
use serde_json::Value as JsonValue;
use std::fmt;

/// A failed or impossible validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The assertion ran and did not hold.
    Failed { path: String, message: String },

    /// The actual body diverged from the expected document.
    BodyMismatch(DiffReport),

    /// The value under test could not be read.
    Document(DocumentError),

    /// The comparison operation name was not recognized.
    UnknownOp(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Failed { path, message } => write!(f, "{}: {}", path, message),
            ValidationError::BodyMismatch(report) => {
                write!(f, "Body mismatch:\n{}", report.render())
            }
            ValidationError::Document(err) => write!(f, "{}", err),
            ValidationError::UnknownOp(name) => {
                write!(f, "Unknown comparison operation '{}'", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<DocumentError> for ValidationError {
    fn from(err: DocumentError) -> Self {
        ValidationError::Document(err)
    }
}

/// Asserts the response status code.
///
/// # Arguments
///
/// * `response` - The response under test
/// * `expected` - The exact status code required
pub fn assert_status(response: &ApiResponse, expected: u16) -> Result<(), ValidationError> {
    if response.status_code == expected {
        Ok(())
    } else {
        Err(ValidationError::Failed {
            path: "status".to_string(),
            message: format!("Expected {} but got {}", expected, response.status_code),
        })
    }
}

/// Asserts one field of the response body.
///
/// The body format (JSON or XML) is detected from the content itself.
pub fn assert_response_field(
    response: &ApiResponse,
    path: &str,
    op: CompareOp,
    expected: &JsonValue,
) -> Result<(), ValidationError> {
    let body = response
        .body_as_string()
        .map_err(|e| ValidationError::Document(DocumentError::InvalidDocument(e.to_string())))?;
    assert_field(&body, path, op, expected)
}

/// Asserts that the response body matches an expected JSON document.
///
/// # Returns
///
/// `Ok(())` on a full match, otherwise [`ValidationError::BodyMismatch`]
/// carrying the complete difference report.
pub fn assert_body_matches(
    response: &ApiResponse,
    expected_text: &str,
) -> Result<(), ValidationError> {
    let body = response
        .body_as_string()
        .map_err(|e| ValidationError::Document(DocumentError::InvalidDocument(e.to_string())))?;
    let report = diff_documents(expected_text, &body)?;
    if report.is_match() {
        Ok(())
    } else {
        Err(ValidationError::BodyMismatch(report))
    }
}
