//! Read-only path access over the resolved configuration document
//!
//! Lookups here are total: structurally absent nodes, malformed paths, and
//! explicit nulls all read as `None`. Hard failures belong to the editing
//! layer in `crate::document`, not to configuration lookup.

use crate::document::path::{self, Segment};
use log::debug;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Immutable store wrapping one resolved configuration document
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    root: JsonValue,
}

impl DocumentStore {
    pub fn new(root: JsonValue) -> Self {
        Self { root }
    }

    /// A store holding nothing; every lookup misses
    pub fn empty() -> Self {
        Self {
            root: JsonValue::Null,
        }
    }

    pub fn root(&self) -> &JsonValue {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Looks up the node at a dotted path
    ///
    /// Returns `None` for anything that is not a present, non-null node:
    /// missing fields, indices past the end, malformed path expressions
    /// (logged at debug), and explicit `null` values.
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let segments = match path::parse(path) {
            Ok(segments) => segments,
            Err(err) => {
                debug!("Ignoring malformed config path: {}", err);
                return None;
            }
        };

        let mut current = &self.root;
        for segment in &segments {
            current = match segment {
                Segment::Field(name) => current.get(name)?,
                Segment::Index(index) => current.get(index)?,
                Segment::Append => {
                    debug!("Append marker has no meaning in a config lookup: {}", path);
                    return None;
                }
            };
        }

        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    /// Renders the addressed node as text: scalars bare, subtrees as JSON
    pub fn get_rendered(&self, path: &str) -> Option<String> {
        let node = self.get(path)?;
        match node {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            other => serde_json::to_string(other).ok(),
        }
    }

    /// Extracts a string-valued table (headers, query params, cookies)
    ///
    /// Scalar values are rendered to text; `null` entries are dropped.
    pub fn get_string_map(&self, path: &str) -> Option<HashMap<String, String>> {
        let object = self.get(path)?.as_object()?;
        let mut map = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let rendered = match value {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                JsonValue::Null => continue,
                other => serde_json::to_string(other).ok()?,
            };
            map.insert(key.clone(), rendered);
        }
        Some(map)
    }
}
