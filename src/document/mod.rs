//! Structured-document engine
//!
//! One path vocabulary, two interchangeable editors. The content kind of a
//! document is sniffed once from its leading character and routes every
//! read, update, and delete to the JSON or XML implementation. Values move
//! in and out as [`FieldValue`]s, tagged with the kind the caller selected
//! rather than inferred from string shape.

pub mod error;
pub mod json;
pub mod path;
pub mod xml;

pub use error::DocumentError;
pub use json::JsonEditor;
pub use xml::XmlEditor;

use serde_json::Value as JsonValue;

/// Kind of structured document, resolved once per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Xml,
    Unknown,
}

impl ContentKind {
    /// Sniffs the kind from the first non-whitespace character
    ///
    /// `{` or `[` mean JSON, `<` means XML, anything else is unknown.
    pub fn sniff(doc: &str) -> Self {
        match doc.trim_start().chars().next() {
            Some('{') | Some('[') => ContentKind::Json,
            Some('<') => ContentKind::Xml,
            _ => ContentKind::Unknown,
        }
    }
}

/// The value kind a caller requests from a typed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Double,
    Boolean,
    Node,
}

/// A typed value flowing into or out of a document
///
/// The variant is always chosen by the caller; nothing here guesses a type
/// from the spelling of a string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// A JSON subtree; only meaningful for JSON documents
    Node(JsonValue),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Double(_) => FieldKind::Double,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Node(_) => FieldKind::Node,
        }
    }

    /// The JSON representation used when writing into a JSON document
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Text(s) => JsonValue::String(s.clone()),
            FieldValue::Integer(i) => JsonValue::from(*i),
            FieldValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Boolean(b) => JsonValue::Bool(*b),
            FieldValue::Node(v) => v.clone(),
        }
    }

    /// The text form used when writing into an XML document
    ///
    /// `None` for [`FieldValue::Node`], which has no XML rendering.
    pub fn render_scalar(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Double(d) => Some(d.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Node(_) => None,
        }
    }

    /// Coerces a JSON node into the requested kind
    ///
    /// Strings holding a clean numeric or boolean spelling coerce to those
    /// kinds, since configuration frequently carries numbers as text.
    pub(crate) fn from_json_node(
        node: &JsonValue,
        kind: FieldKind,
        path: &str,
    ) -> Result<Self, DocumentError> {
        let mismatch = |expected: &str| DocumentError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
        };

        match kind {
            FieldKind::Text => match node {
                JsonValue::String(s) => Ok(FieldValue::Text(s.clone())),
                JsonValue::Number(n) => Ok(FieldValue::Text(n.to_string())),
                JsonValue::Bool(b) => Ok(FieldValue::Text(b.to_string())),
                _ => Err(mismatch("text scalar")),
            },
            FieldKind::Integer => match node {
                JsonValue::Number(n) => {
                    n.as_i64().map(FieldValue::Integer).ok_or_else(|| mismatch("integer"))
                }
                JsonValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .map_err(|_| mismatch("integer")),
                _ => Err(mismatch("integer")),
            },
            FieldKind::Double => match node {
                JsonValue::Number(n) => {
                    n.as_f64().map(FieldValue::Double).ok_or_else(|| mismatch("double"))
                }
                JsonValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(FieldValue::Double)
                    .map_err(|_| mismatch("double")),
                _ => Err(mismatch("double")),
            },
            FieldKind::Boolean => match node {
                JsonValue::Bool(b) => Ok(FieldValue::Boolean(*b)),
                JsonValue::String(s) if s.eq_ignore_ascii_case("true") => {
                    Ok(FieldValue::Boolean(true))
                }
                JsonValue::String(s) if s.eq_ignore_ascii_case("false") => {
                    Ok(FieldValue::Boolean(false))
                }
                _ => Err(mismatch("boolean")),
            },
            FieldKind::Node => Ok(FieldValue::Node(node.clone())),
        }
    }

    /// Coerces element text into the requested kind
    pub(crate) fn from_text(text: &str, kind: FieldKind, path: &str) -> Result<Self, DocumentError> {
        let mismatch = |expected: &str| DocumentError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
        };

        match kind {
            FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
            FieldKind::Integer => text
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| mismatch("integer")),
            FieldKind::Double => text
                .trim()
                .parse::<f64>()
                .map(FieldValue::Double)
                .map_err(|_| mismatch("double")),
            FieldKind::Boolean => {
                let trimmed = text.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(FieldValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(FieldValue::Boolean(false))
                } else {
                    Err(mismatch("boolean"))
                }
            }
            FieldKind::Node => Err(mismatch("JSON node (not available for XML)")),
        }
    }
}

/// Path-addressed operations every document editor provides
pub trait DocumentEditor {
    /// Reads the node at `path` as text
    fn read(&self, doc: &str, path: &str) -> Result<String, DocumentError>;

    /// Reads the node at `path` coerced into the requested kind
    fn read_typed(&self, doc: &str, path: &str, kind: FieldKind) -> Result<FieldValue, DocumentError>;

    /// Replaces or creates the node at `path`, returning the new document text
    fn update(&self, doc: &str, path: &str, value: &FieldValue) -> Result<String, DocumentError>;

    /// Removes the node at `path` if present, returning the new document text
    fn delete(&self, doc: &str, path: &str) -> Result<String, DocumentError>;
}

/// Reads the node at `path`, routing on the sniffed content kind
pub fn read(doc: &str, path: &str) -> Result<String, DocumentError> {
    match ContentKind::sniff(doc) {
        ContentKind::Json => JsonEditor::new().read(doc, path),
        ContentKind::Xml => XmlEditor::new().read(doc, path),
        ContentKind::Unknown => Err(DocumentError::UnrecognizedContent),
    }
}

/// Typed read, routing on the sniffed content kind
pub fn read_typed(doc: &str, path: &str, kind: FieldKind) -> Result<FieldValue, DocumentError> {
    match ContentKind::sniff(doc) {
        ContentKind::Json => JsonEditor::new().read_typed(doc, path, kind),
        ContentKind::Xml => XmlEditor::new().read_typed(doc, path, kind),
        ContentKind::Unknown => Err(DocumentError::UnrecognizedContent),
    }
}

/// Update, routing on the sniffed content kind
pub fn update(doc: &str, path: &str, value: &FieldValue) -> Result<String, DocumentError> {
    match ContentKind::sniff(doc) {
        ContentKind::Json => JsonEditor::new().update(doc, path, value),
        ContentKind::Xml => XmlEditor::new().update(doc, path, value),
        ContentKind::Unknown => Err(DocumentError::UnrecognizedContent),
    }
}

/// Delete, routing on the sniffed content kind
pub fn delete(doc: &str, path: &str) -> Result<String, DocumentError> {
    match ContentKind::sniff(doc) {
        ContentKind::Json => JsonEditor::new().delete(doc, path),
        ContentKind::Xml => XmlEditor::new().delete(doc, path),
        ContentKind::Unknown => Err(DocumentError::UnrecognizedContent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_json() {
        assert_eq!(ContentKind::sniff(r#"{"a":1}"#), ContentKind::Json);
        assert_eq!(ContentKind::sniff("  [1,2]"), ContentKind::Json);
    }

    #[test]
    fn test_sniff_xml() {
        assert_eq!(ContentKind::sniff("<root/>"), ContentKind::Xml);
        assert_eq!(ContentKind::sniff("\n <a>x</a>"), ContentKind::Xml);
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(ContentKind::sniff("plain text"), ContentKind::Unknown);
        assert_eq!(ContentKind::sniff(""), ContentKind::Unknown);
    }

    #[test]
    fn test_dispatch_read_json() {
        let doc = r#"{"user": {"name": "Alice"}}"#;
        assert_eq!(read(doc, "user.name").unwrap(), "Alice");
    }

    #[test]
    fn test_dispatch_read_xml() {
        let doc = "<user><name>Alice</name></user>";
        assert_eq!(read(doc, "name").unwrap(), "Alice");
    }

    #[test]
    fn test_dispatch_unknown_content() {
        let err = read("hello there", "a.b").unwrap_err();
        assert_eq!(err, DocumentError::UnrecognizedContent);
    }

    #[test]
    fn test_dispatch_update_both_kinds() {
        let json_out = update(
            r#"{"name":"Alice"}"#,
            "name",
            &FieldValue::Text("Bob".to_string()),
        )
        .unwrap();
        assert_eq!(read(&json_out, "name").unwrap(), "Bob");

        let xml_out = update(
            "<user><name>Alice</name></user>",
            "name",
            &FieldValue::Text("Bob".to_string()),
        )
        .unwrap();
        assert_eq!(read(&xml_out, "name").unwrap(), "Bob");
    }

    #[test]
    fn test_dispatch_delete_both_kinds() {
        let json_out = delete(r#"{"a":1,"b":2}"#, "a").unwrap();
        assert!(read(&json_out, "a").is_err());

        let xml_out = delete("<r><a>1</a><b>2</b></r>", "a").unwrap();
        assert!(read(&xml_out, "a").is_err());
    }

    #[test]
    fn test_field_value_kind() {
        assert_eq!(FieldValue::Integer(1).kind(), FieldKind::Integer);
        assert_eq!(FieldValue::Text("x".to_string()).kind(), FieldKind::Text);
    }

    #[test]
    fn test_field_value_to_json() {
        assert_eq!(FieldValue::Integer(5).to_json(), serde_json::json!(5));
        assert_eq!(FieldValue::Boolean(true).to_json(), serde_json::json!(true));
        assert_eq!(
            FieldValue::Text("hi".to_string()).to_json(),
            serde_json::json!("hi")
        );
    }

    #[test]
    fn test_field_value_render_scalar() {
        assert_eq!(FieldValue::Double(1.5).render_scalar(), Some("1.5".to_string()));
        assert_eq!(FieldValue::Node(serde_json::json!({})).render_scalar(), None);
    }

    #[test]
    fn test_from_text_coercions() {
        assert_eq!(
            FieldValue::from_text("42", FieldKind::Integer, "p").unwrap(),
            FieldValue::Integer(42)
        );
        assert_eq!(
            FieldValue::from_text("TRUE", FieldKind::Boolean, "p").unwrap(),
            FieldValue::Boolean(true)
        );
        assert!(FieldValue::from_text("abc", FieldKind::Double, "p").is_err());
    }
}
