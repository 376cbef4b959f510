//! Error types for structured-document reads and edits

use std::fmt;

/// Errors that can occur when reading or editing a structured document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The path expression itself is invalid
    MalformedPath { path: String, reason: String },

    /// The path is well-formed but addresses nothing in this document
    MissingPath { path: String },

    /// A literal index addressed a position past the end of an array
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// The addressed node has a different shape than the operation requires
    TypeMismatch { path: String, expected: String },

    /// The document is neither JSON nor XML
    UnrecognizedContent,

    /// The document text could not be parsed
    InvalidDocument(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::MalformedPath { path, reason } => {
                write!(f, "Malformed path '{}': {}", path, reason)
            }
            DocumentError::MissingPath { path } => {
                write!(f, "Path '{}' not found in document", path)
            }
            DocumentError::IndexOutOfBounds { path, index, len } => {
                write!(
                    f,
                    "Index {} out of bounds at '{}' (length {})",
                    index, path, len
                )
            }
            DocumentError::TypeMismatch { path, expected } => {
                write!(f, "Type mismatch at '{}': expected {}", path, expected)
            }
            DocumentError::UnrecognizedContent => {
                write!(f, "Document content is neither JSON nor XML")
            }
            DocumentError::InvalidDocument(msg) => {
                write!(f, "Failed to parse document: {}", msg)
            }
        }
    }
}

impl std::error::Error for DocumentError {}

impl DocumentError {
    /// Shorthand constructor for [`DocumentError::MalformedPath`]
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        DocumentError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand constructor for [`DocumentError::MissingPath`]
    pub(crate) fn missing(path: &str) -> Self {
        DocumentError::MissingPath {
            path: path.to_string(),
        }
    }
}
