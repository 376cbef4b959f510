//! Environment-definition file loading
//!
//! Parses the flat KEY=VALUE file that names the active environment and
//! seeds the values available to ${name} placeholder substitution.

use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Keys that name the active environment inside the definition file
const ENVIRONMENT_KEYS: [&str; 2] = ["env", "environment"];

/// Errors that can occur when loading an environment-definition file
#[derive(Debug, Clone, PartialEq)]
pub enum EnvFileError {
    /// The file does not exist
    NotFound(String),
    /// The file exists but could not be read
    Io(String),
}

impl fmt::Display for EnvFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvFileError::NotFound(path) => {
                write!(f, "Environment file not found: {}", path)
            }
            EnvFileError::Io(msg) => write!(f, "Failed to read environment file: {}", msg),
        }
    }
}

impl std::error::Error for EnvFileError {}

/// Flat key-value environment definition with case-insensitive lookup
#[derive(Debug, Clone, Default)]
pub struct EnvironmentMap {
    values: HashMap<String, String>,
}

impl EnvironmentMap {
    /// Creates an empty environment map
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Wraps an existing key-value map
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Looks up a value by key
    ///
    /// An exact-case entry wins; otherwise keys are compared
    /// case-insensitively, with collisions resolved in sorted key order.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.values.get(name) {
            return Some(value.as_str());
        }
        let mut candidates: Vec<&String> = self
            .values
            .keys()
            .filter(|key| key.eq_ignore_ascii_case(name))
            .collect();
        candidates.sort();
        candidates.last().map(|key| self.values[*key].as_str())
    }

    /// Inserts or replaces an entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The environment named by the `env`/`environment` key, if present
    pub fn active_environment(&self) -> Option<&str> {
        ENVIRONMENT_KEYS.iter().find_map(|key| self.get(key))
    }

    /// Read-only view of the underlying map
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Loads an environment-definition file from disk
///
/// Lines have the form `KEY=VALUE`. Blank lines and lines starting with `#`
/// are skipped. Values may be wrapped in single or double quotes, which are
/// stripped. Lines without an `=` separator are skipped with a warning
/// rather than failing the whole file.
///
/// # Errors
///
/// Returns [`EnvFileError::NotFound`] when the file does not exist and
/// [`EnvFileError::Io`] when it cannot be read.
pub fn load_env_file(path: &Path) -> Result<EnvironmentMap, EnvFileError> {
    if !path.exists() {
        return Err(EnvFileError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| EnvFileError::Io(format!("{}: {}", path.display(), e)))?;

    Ok(parse_env_content(&content))
}

/// Parses KEY=VALUE content into an [`EnvironmentMap`]
fn parse_env_content(content: &str) -> EnvironmentMap {
    let mut values = HashMap::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();

            if key.is_empty() {
                warn!("Skipping line {} with empty key", index + 1);
                continue;
            }

            // Remove surrounding quotes if present
            let value = if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                &value[1..value.len() - 1]
            } else {
                value
            };

            values.insert(key.to_string(), value.to_string());
        } else {
            warn!("Skipping invalid line {}: '{}'", index + 1, line);
        }
    }

    EnvironmentMap::from_map(values)
}
