//! Merge modes for request parameter tables.
//!
//! Every string table on a request (headers, query params, form params,
//! path params, cookies) accepts incoming entries under one of three
//! modes: replace the table, upsert into it, or delete named keys.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How an incoming table combines with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeMode {
    /// Discard the existing table and use the incoming entries as-is.
    Set,
    /// Insert or overwrite the incoming entries, keeping the rest.
    Update,
    /// Remove the keys named by the incoming entries; values are ignored.
    Delete,
}

impl MergeMode {
    /// Returns the lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Set => "set",
            MergeMode::Update => "update",
            MergeMode::Delete => "delete",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a merge mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeModeError {
    input: String,
}

impl fmt::Display for MergeModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown merge mode '{}' (expected set, update, or delete)",
            self.input
        )
    }
}

impl std::error::Error for MergeModeError {}

impl FromStr for MergeMode {
    type Err = MergeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "set" => Ok(MergeMode::Set),
            "update" => Ok(MergeMode::Update),
            "delete" => Ok(MergeMode::Delete),
            _ => Err(MergeModeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Applies `incoming` to `existing` under the given mode.
///
/// # Arguments
///
/// * `existing` - The table being modified in place
/// * `incoming` - Entries to set, upsert, or whose keys to delete
/// * `mode` - How the tables combine
pub fn merge_map(
    existing: &mut HashMap<String, String>,
    incoming: HashMap<String, String>,
    mode: MergeMode,
) {
    match mode {
        MergeMode::Set => {
            *existing = incoming;
        }
        MergeMode::Update => {
            existing.extend(incoming);
        }
        MergeMode::Delete => {
            for key in incoming.keys() {
                existing.remove(key);
            }
        }
    }
}
