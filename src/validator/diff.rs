//! Whole-document comparison with a readable difference report.
//!
//! The report lists one entry per divergence, addressed by the same dot
//! paths the editors use. Array length mismatches report as
//! `path[]: Expected N values but got M`; common-prefix elements still
//! compare so a single missing element does not drown the rest.

use super::compare::values_equal;
use crate::document::DocumentError;
use serde_json::Value as JsonValue;
use std::fmt;

/// One divergence between expected and actual documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Dot path to the diverging node; `$` for the document root.
    pub path: String,
    /// Human-readable description of the divergence.
    pub message: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every divergence found between two documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    entries: Vec<DiffEntry>,
}

impl DiffReport {
    /// `true` when the documents agree everywhere.
    pub fn is_match(&self) -> bool {
        self.entries.is_empty()
    }

    /// The individual divergences, in document order.
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Renders the report as one line per divergence.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(DiffEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Compares two JSON documents and reports every divergence.
///
/// # Arguments
///
/// * `expected_text` - The document the test expects
/// * `actual_text` - The document that actually arrived
///
/// # Returns
///
/// A [`DiffReport`], or a [`DocumentError`] when either text fails to
/// parse as JSON.
pub fn diff_documents(expected_text: &str, actual_text: &str) -> Result<DiffReport, DocumentError> {
    let expected: JsonValue = serde_json::from_str(expected_text)
        .map_err(|e| DocumentError::InvalidDocument(format!("expected document: {}", e)))?;
    let actual: JsonValue = serde_json::from_str(actual_text)
        .map_err(|e| DocumentError::InvalidDocument(format!("actual document: {}", e)))?;

    let mut entries = Vec::new();
    diff_value("", &expected, &actual, &mut entries);
    Ok(DiffReport { entries })
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

fn render_plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn diff_value(path: &str, expected: &JsonValue, actual: &JsonValue, entries: &mut Vec<DiffEntry>) {
    match (expected, actual) {
        (JsonValue::Object(expected_map), JsonValue::Object(actual_map)) => {
            for (key, expected_child) in expected_map {
                let child_path = join_path(path, key);
                match actual_map.get(key) {
                    Some(actual_child) => {
                        diff_value(&child_path, expected_child, actual_child, entries)
                    }
                    None => entries.push(DiffEntry {
                        path: child_path,
                        message: format!(
                            "Expected {} but the field is missing",
                            render_plain(expected_child)
                        ),
                    }),
                }
            }
            for (key, actual_child) in actual_map {
                if !expected_map.contains_key(key) {
                    entries.push(DiffEntry {
                        path: join_path(path, key),
                        message: format!("Unexpected value {}", render_plain(actual_child)),
                    });
                }
            }
        }
        (JsonValue::Array(expected_items), JsonValue::Array(actual_items)) => {
            if expected_items.len() != actual_items.len() {
                entries.push(DiffEntry {
                    path: format!("{}[]", display_path(path)),
                    message: format!(
                        "Expected {} values but got {}",
                        expected_items.len(),
                        actual_items.len()
                    ),
                });
            }
            for (index, (expected_item, actual_item)) in
                expected_items.iter().zip(actual_items.iter()).enumerate()
            {
                let child_path = format!("{}[{}]", display_path(path), index);
                diff_value(&child_path, expected_item, actual_item, entries);
            }
        }
        (expected_leaf, actual_leaf) => {
            if !values_equal(actual_leaf, expected_leaf) {
                entries.push(DiffEntry {
                    path: display_path(path),
                    message: format!(
                        "Expected {} but got {}",
                        render_plain(expected_leaf),
                        render_plain(actual_leaf)
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents_match() {
        let report = diff_documents(r#"{"a": 1, "b": [1, 2]}"#, r#"{"b": [1, 2], "a": 1}"#).unwrap();
        assert!(report.is_match());
        assert_eq!(report.render(), "");
    }

    #[test]
    fn test_scalar_divergence() {
        let report = diff_documents(r#"{"status": "open"}"#, r#"{"status": "closed"}"#).unwrap();
        assert!(!report.is_match());
        assert_eq!(report.entries().len(), 1);
        assert_eq!(
            report.entries()[0].to_string(),
            "status: Expected open but got closed"
        );
    }

    #[test]
    fn test_numeric_tolerance_in_diff() {
        let report = diff_documents(r#"{"price": 10.0}"#, r#"{"price": 10.00001}"#).unwrap();
        assert!(report.is_match());
    }

    #[test]
    fn test_large_integer_ids_diverge() {
        // 2^53 and 2^53+1 are the same f64; the diff must still see them
        let report = diff_documents(
            r#"{"id": 9007199254740993}"#,
            r#"{"id": 9007199254740992}"#,
        )
        .unwrap();
        assert!(!report.is_match());
        assert_eq!(
            report.entries()[0].to_string(),
            "id: Expected 9007199254740993 but got 9007199254740992"
        );
    }

    #[test]
    fn test_diff_lists_one_entry_per_divergence() {
        let expected = r#"{"my_double": 12.34, "my_integer": 123, "my_flag": true, "items": [1, 2, 3, 4, 5]}"#;
        let actual = r#"{"my_double": 12.35, "my_integer": 124, "my_flag": false, "items": [1, 2, 3, 4]}"#;
        let report = diff_documents(expected, actual).unwrap();

        assert_eq!(report.entries().len(), 4);
        let rendered = report.render();
        assert!(rendered.contains("my_double: Expected 12.34 but got 12.35"));
        assert!(rendered.contains("my_integer: Expected 123 but got 124"));
        assert!(rendered.contains("my_flag: Expected true but got false"));
        assert!(rendered.contains("items[]: Expected 5 values but got 4"));
    }

    #[test]
    fn test_missing_and_unexpected_fields() {
        let report = diff_documents(r#"{"a": 1, "b": 2}"#, r#"{"a": 1, "c": 3}"#).unwrap();
        let rendered = report.render();
        assert!(rendered.contains("b: Expected 2 but the field is missing"));
        assert!(rendered.contains("c: Unexpected value 3"));
    }

    #[test]
    fn test_array_length_mismatch_format() {
        let report =
            diff_documents(r#"{"items": [1, 2, 3]}"#, r#"{"items": [1, 2]}"#).unwrap();
        assert_eq!(
            report.entries()[0].to_string(),
            "items[]: Expected 3 values but got 2"
        );
    }

    #[test]
    fn test_array_prefix_still_compared() {
        let report = diff_documents(r#"{"items": [1, 5, 3]}"#, r#"{"items": [1, 2]}"#).unwrap();
        let rendered = report.render();
        assert!(rendered.contains("items[]: Expected 3 values but got 2"));
        assert!(rendered.contains("items[1]: Expected 5 but got 2"));
        // The matching first element produces no entry
        assert!(!rendered.contains("items[0]"));
    }

    #[test]
    fn test_nested_paths() {
        let report = diff_documents(
            r#"{"user": {"address": {"city": "Paris"}}}"#,
            r#"{"user": {"address": {"city": "Lyon"}}}"#,
        )
        .unwrap();
        assert_eq!(
            report.entries()[0].to_string(),
            "user.address.city: Expected Paris but got Lyon"
        );
    }

    #[test]
    fn test_type_mismatch_reports_at_leaf() {
        let report = diff_documents(r#"{"a": {"b": 1}}"#, r#"{"a": [1]}"#).unwrap();
        assert_eq!(report.entries().len(), 1);
        assert!(report.entries()[0].path.starts_with('a'));
    }

    #[test]
    fn test_root_array_mismatch() {
        let report = diff_documents("[1, 2]", "[1]").unwrap();
        assert_eq!(
            report.entries()[0].to_string(),
            "$[]: Expected 2 values but got 1"
        );
    }

    #[test]
    fn test_root_scalar_path_is_dollar() {
        let report = diff_documents("1", "2").unwrap();
        assert_eq!(report.entries()[0].to_string(), "$: Expected 1 but got 2");
    }

    #[test]
    fn test_malformed_input_fails() {
        assert!(diff_documents("{not json", "{}").is_err());
        assert!(diff_documents("{}", "{not json").is_err());
    }
}
