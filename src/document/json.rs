//! JSON document editing
//!
//! Path-addressed read, update, and delete over JSON text. The document is
//! parsed once per operation, mutated as a tree, and serialized back to
//! compact JSON.

use super::error::DocumentError;
use super::path::{parse, Segment};
use super::{DocumentEditor, FieldKind, FieldValue};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Path-addressed editor for JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEditor;

impl JsonEditor {
    pub fn new() -> Self {
        JsonEditor
    }

    /// Reads the node at `path` and deserializes it into `T`
    ///
    /// # Examples
    ///
    /// ```
    /// use rest_harness::document::json::JsonEditor;
    ///
    /// let doc = r#"{"user": {"id": 42, "name": "Alice"}}"#;
    /// let id: u32 = JsonEditor::new().read_as(doc, "$.user.id").unwrap();
    /// assert_eq!(id, 42);
    /// ```
    pub fn read_as<T: DeserializeOwned>(&self, doc: &str, path: &str) -> Result<T, DocumentError> {
        let root = parse_document(doc)?;
        let segments = parse(path)?;
        let node = locate(&root, &segments, path)?;
        serde_json::from_value(node.clone()).map_err(|e| DocumentError::TypeMismatch {
            path: path.to_string(),
            expected: e.to_string(),
        })
    }
}

impl DocumentEditor for JsonEditor {
    fn read(&self, doc: &str, path: &str) -> Result<String, DocumentError> {
        let root = parse_document(doc)?;
        let segments = parse(path)?;
        let node = locate(&root, &segments, path)?;
        render_node(node)
    }

    fn read_typed(&self, doc: &str, path: &str, kind: FieldKind) -> Result<FieldValue, DocumentError> {
        let root = parse_document(doc)?;
        let segments = parse(path)?;
        let node = locate(&root, &segments, path)?;
        FieldValue::from_json_node(node, kind, path)
    }

    fn update(&self, doc: &str, path: &str, value: &FieldValue) -> Result<String, DocumentError> {
        let mut root = parse_document(doc)?;
        let segments = parse(path)?;
        update_node(&mut root, &segments, &value.to_json(), path)?;
        serialize_document(&root)
    }

    fn delete(&self, doc: &str, path: &str) -> Result<String, DocumentError> {
        let mut root = parse_document(doc)?;
        let segments = parse(path)?;
        delete_node(&mut root, &segments, path)?;
        serialize_document(&root)
    }
}

/// Parses JSON text, mapping parse failures to [`DocumentError::InvalidDocument`]
fn parse_document(doc: &str) -> Result<JsonValue, DocumentError> {
    serde_json::from_str(doc).map_err(|e| DocumentError::InvalidDocument(e.to_string()))
}

fn serialize_document(root: &JsonValue) -> Result<String, DocumentError> {
    serde_json::to_string(root).map_err(|e| DocumentError::InvalidDocument(e.to_string()))
}

/// Walks read-only to the addressed node
///
/// Anything structurally absent reports [`DocumentError::MissingPath`];
/// append markers have no meaning in a read.
fn locate<'a>(
    root: &'a JsonValue,
    segments: &[Segment],
    path: &str,
) -> Result<&'a JsonValue, DocumentError> {
    let mut current = root;

    for segment in segments {
        current = match segment {
            Segment::Field(name) => current
                .get(name)
                .ok_or_else(|| DocumentError::missing(path))?,
            Segment::Index(index) => current
                .get(index)
                .ok_or_else(|| DocumentError::missing(path))?,
            Segment::Append => {
                return Err(DocumentError::malformed(
                    path,
                    "append marker not allowed in a read",
                ));
            }
        };
    }

    Ok(current)
}

/// Renders the addressed node as text
///
/// Scalars render bare (strings without quotes); objects and arrays
/// serialize as JSON.
fn render_node(value: &JsonValue) -> Result<String, DocumentError> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Null => Ok("null".to_string()),
        JsonValue::Array(_) | JsonValue::Object(_) => serde_json::to_string(value)
            .map_err(|e| DocumentError::InvalidDocument(e.to_string())),
    }
}

fn type_mismatch(path: &str, expected: &str) -> DocumentError {
    DocumentError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}

/// Applies an update along `segments`
///
/// Intermediate segments must already exist. The final segment may create a
/// missing leaf under an existing parent: a field is inserted into its
/// object, and an append turns a `null` (or freshly created) slot into a
/// one-element array. A literal index never extends an array.
fn update_node(
    current: &mut JsonValue,
    segments: &[Segment],
    value: &JsonValue,
    path: &str,
) -> Result<(), DocumentError> {
    match segments {
        [] => Err(DocumentError::malformed(
            path,
            "cannot update the document root",
        )),
        [leaf] => apply_leaf(current, leaf, value, path),
        [head, rest @ ..] => match head {
            Segment::Field(name) => {
                let object = match current {
                    JsonValue::Object(map) => map,
                    _ => return Err(type_mismatch(path, "object")),
                };
                // An append leaf may create its own array under an existing
                // parent; seed a null slot for it to convert.
                if matches!(rest, [Segment::Append]) {
                    let child = object.entry(name.clone()).or_insert(JsonValue::Null);
                    return update_node(child, rest, value, path);
                }
                match object.get_mut(name) {
                    Some(child) => update_node(child, rest, value, path),
                    None => Err(DocumentError::missing(path)),
                }
            }
            Segment::Index(index) => {
                let array = match current {
                    JsonValue::Array(items) => items,
                    _ => return Err(type_mismatch(path, "array")),
                };
                let len = array.len();
                match array.get_mut(*index) {
                    Some(child) => update_node(child, rest, value, path),
                    None => Err(DocumentError::IndexOutOfBounds {
                        path: path.to_string(),
                        index: *index,
                        len,
                    }),
                }
            }
            Segment::Append => Err(DocumentError::malformed(
                path,
                "append marker only allowed at the end",
            )),
        },
    }
}

fn apply_leaf(
    parent: &mut JsonValue,
    leaf: &Segment,
    value: &JsonValue,
    path: &str,
) -> Result<(), DocumentError> {
    match leaf {
        Segment::Field(name) => match parent {
            JsonValue::Object(map) => {
                map.insert(name.clone(), value.clone());
                Ok(())
            }
            // A null parent becomes an object holding the new leaf.
            JsonValue::Null => {
                let mut map = serde_json::Map::new();
                map.insert(name.clone(), value.clone());
                *parent = JsonValue::Object(map);
                Ok(())
            }
            _ => Err(type_mismatch(path, "object")),
        },
        Segment::Index(index) => match parent {
            JsonValue::Array(items) => {
                let len = items.len();
                match items.get_mut(*index) {
                    Some(slot) => {
                        *slot = value.clone();
                        Ok(())
                    }
                    None => Err(DocumentError::IndexOutOfBounds {
                        path: path.to_string(),
                        index: *index,
                        len,
                    }),
                }
            }
            _ => Err(type_mismatch(path, "array")),
        },
        Segment::Append => match parent {
            JsonValue::Array(items) => {
                items.push(value.clone());
                Ok(())
            }
            JsonValue::Null => {
                *parent = JsonValue::Array(vec![value.clone()]);
                Ok(())
            }
            _ => Err(type_mismatch(path, "array")),
        },
    }
}

/// Removes the addressed node; structural absence anywhere is a no-op
fn delete_node(
    current: &mut JsonValue,
    segments: &[Segment],
    path: &str,
) -> Result<(), DocumentError> {
    match segments {
        [] => Err(DocumentError::malformed(
            path,
            "cannot delete the document root",
        )),
        [leaf] => match leaf {
            Segment::Field(name) => {
                if let JsonValue::Object(map) = current {
                    map.remove(name);
                }
                Ok(())
            }
            Segment::Index(index) => {
                if let JsonValue::Array(items) = current {
                    if *index < items.len() {
                        items.remove(*index);
                    }
                }
                Ok(())
            }
            Segment::Append => Err(DocumentError::malformed(
                path,
                "append marker not allowed in a delete",
            )),
        },
        [head, rest @ ..] => match head {
            Segment::Field(name) => {
                if let JsonValue::Object(map) = current {
                    if let Some(child) = map.get_mut(name) {
                        return delete_node(child, rest, path);
                    }
                }
                Ok(())
            }
            Segment::Index(index) => {
                if let JsonValue::Array(items) = current {
                    if let Some(child) = items.get_mut(*index) {
                        return delete_node(child, rest, path);
                    }
                }
                Ok(())
            }
            Segment::Append => Err(DocumentError::malformed(
                path,
                "append marker not allowed in a delete",
            )),
        },
    }
}
