//! Environment-aware configuration resolution
//!
//! Builds the merged configuration document once per resolver: every YAML
//! file under the config directory is deep-merged in sorted file-name
//! order (later files win on conflict), the merged tree is pivoted
//! environment-first, serialized, run through a single placeholder pass,
//! and re-parsed. Lookups then try `"{primary}.{api}.{field}"` and fall
//! back to the fallback environment only when the primary key is absent.

use super::document::DocumentStore;
use super::env_file::{load_env_file, EnvironmentMap};
use super::placeholder::{self, MissingKeyMode};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment used when nothing names one, and the default fallback tier
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Errors that can occur while building the configuration document
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A file or directory could not be read or written
    Io(String),

    /// A configuration file (or the substituted document) failed to parse
    Parse { file: String, message: String },

    /// The merged document could not be serialized
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Configuration IO error: {}", msg),
            ConfigError::Parse { file, message } => {
                write!(f, "Failed to parse {}: {}", file, message)
            }
            ConfigError::Serialize(msg) => {
                write!(f, "Failed to serialize configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where configuration comes from and which environments apply
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    config_dir: PathBuf,
    env_file: Option<PathBuf>,
    primary_env: Option<String>,
    fallback_env: String,
}

impl ResolverSettings {
    /// Settings reading YAML from `config_dir`, with no environment file,
    /// the primary environment taken from that file (or `default`), and
    /// `default` as the fallback tier
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            env_file: None,
            primary_env: None,
            fallback_env: DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    /// Reads KEY=VALUE environment definitions from `path`
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Overrides the primary environment regardless of the env file
    pub fn with_primary_env(mut self, env: impl Into<String>) -> Self {
        self.primary_env = Some(env.into());
        self
    }

    /// Overrides the fallback environment tier
    pub fn with_fallback_env(mut self, env: impl Into<String>) -> Self {
        self.fallback_env = env.into();
        self
    }
}

/// State produced by the one-time load
#[derive(Debug)]
struct LoadedConfig {
    store: DocumentStore,
    env_map: EnvironmentMap,
    primary_env: String,
}

/// Environment-aware configuration lookup
///
/// The backing document loads lazily on first access and exactly once;
/// concurrent first lookups block on the same initialization. A failed
/// load logs a warning and degrades to an empty store, so lookups miss
/// rather than panic.
#[derive(Debug)]
pub struct ConfigResolver {
    settings: ResolverSettings,
    loaded: OnceCell<LoadedConfig>,
}

impl ConfigResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            loaded: OnceCell::new(),
        }
    }

    fn loaded(&self) -> &LoadedConfig {
        self.loaded.get_or_init(|| match load(&self.settings) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!("Configuration load failed, lookups will miss: {}", err);
                let primary_env = self
                    .settings
                    .primary_env
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
                LoadedConfig {
                    store: DocumentStore::empty(),
                    env_map: EnvironmentMap::new(),
                    primary_env,
                }
            }
        })
    }

    /// The environment consulted first by every lookup
    pub fn primary_env(&self) -> &str {
        &self.loaded().primary_env
    }

    /// The environment consulted when the primary has no value
    pub fn fallback_env(&self) -> &str {
        &self.settings.fallback_env
    }

    /// A value from the environment-definition file
    pub fn environment_value(&self, name: &str) -> Option<String> {
        self.loaded().env_map.get(name).map(str::to_string)
    }

    /// The loaded environment definitions
    pub fn environment(&self) -> &EnvironmentMap {
        &self.loaded().env_map
    }

    /// The resolved configuration document
    pub fn store(&self) -> &DocumentStore {
        &self.loaded().store
    }

    /// Composes the lookup key whose node actually exists, primary first
    fn resolve_key(&self, api_name: &str, field_path: &str) -> Option<String> {
        if api_name.trim().is_empty() {
            warn!("Config lookup with empty API name (field '{}')", field_path);
            return None;
        }

        let loaded = self.loaded();
        let primary_key = format!("{}.{}.{}", loaded.primary_env, api_name, field_path);
        if loaded.store.get(&primary_key).is_some() {
            debug!("Config hit: {}", primary_key);
            return Some(primary_key);
        }

        let fallback_key = format!(
            "{}.{}.{}",
            self.settings.fallback_env, api_name, field_path
        );
        if loaded.store.get(&fallback_key).is_some() {
            debug!("Config fallback hit: {}", fallback_key);
            return Some(fallback_key);
        }

        debug!(
            "Config miss for '{}.{}' in '{}' and '{}'",
            api_name, field_path, loaded.primary_env, self.settings.fallback_env
        );
        None
    }

    /// Looks up one field for an API, falling back across environments
    ///
    /// Absence in the primary environment (including an explicit `null`)
    /// consults the fallback; any present non-null value, however falsy,
    /// wins outright. Returns `None` when neither environment has a value.
    pub fn get(&self, api_name: &str, field_path: &str) -> Option<JsonValue> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get(&key).cloned()
    }

    pub fn get_str(&self, api_name: &str, field_path: &str) -> Option<String> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get_str(&key).map(str::to_string)
    }

    pub fn get_bool(&self, api_name: &str, field_path: &str) -> Option<bool> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get_bool(&key)
    }

    pub fn get_u64(&self, api_name: &str, field_path: &str) -> Option<u64> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get_u64(&key)
    }

    /// Scalar-or-subtree lookup rendered to text
    pub fn get_rendered(&self, api_name: &str, field_path: &str) -> Option<String> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get_rendered(&key)
    }

    /// String-table lookup (headers, query params, cookies)
    pub fn get_string_map(
        &self,
        api_name: &str,
        field_path: &str,
    ) -> Option<HashMap<String, String>> {
        let key = self.resolve_key(api_name, field_path)?;
        self.loaded().store.get_string_map(&key)
    }

    /// Writes the fully resolved document to `dir` as
    /// `resolved-config.yaml` and pretty-printed `resolved-config.json`
    pub fn dump_snapshot(&self, dir: &Path) -> Result<(), ConfigError> {
        let loaded = self.loaded();

        fs::create_dir_all(dir).map_err(|e| ConfigError::Io(e.to_string()))?;

        let yaml = serde_yaml::to_string(loaded.store.root())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(dir.join("resolved-config.yaml"), yaml)
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        let json = serde_json::to_string_pretty(loaded.store.root())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(dir.join("resolved-config.json"), json)
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }
}

/// Runs the full load pipeline for one resolver
fn load(settings: &ResolverSettings) -> Result<LoadedConfig, ConfigError> {
    // Environment definitions come first; substitution needs them.
    let env_map = match &settings.env_file {
        Some(path) => match load_env_file(path) {
            Ok(map) => map,
            Err(err) => {
                warn!("{} - continuing with an empty environment", err);
                EnvironmentMap::new()
            }
        },
        None => EnvironmentMap::new(),
    };

    let primary_env = settings
        .primary_env
        .clone()
        .or_else(|| env_map.active_environment().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

    // Pass 1: merge every file, then pivot to the lookup key layout.
    let merged = merge_config_dir(&settings.config_dir)?;
    let pivoted = pivot_environment_first(merged);

    // Pass 2: one substitution pass over the whole serialized document.
    // The active environment name is exposed as ${env}/${environment}.
    let mut vars = env_map.as_map().clone();
    vars.insert("env".to_string(), primary_env.clone());
    vars.insert("environment".to_string(), primary_env.clone());

    let serialized =
        serde_json::to_string(&pivoted).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    let substituted = placeholder::replace(&serialized, &vars, MissingKeyMode::KeepToken);
    let root: JsonValue = serde_json::from_str(&substituted).map_err(|e| ConfigError::Parse {
        file: "<substituted document>".to_string(),
        message: e.to_string(),
    })?;

    Ok(LoadedConfig {
        store: DocumentStore::new(root),
        env_map,
        primary_env,
    })
}

/// Deep-merges all YAML files under `dir`, sorted by file name
fn merge_config_dir(dir: &Path) -> Result<JsonValue, ConfigError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ConfigError::Io(format!("{}: {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false)
        })
        .collect();

    // Later files win on conflicting leaves, so order must be stable.
    files.sort();

    let mut merged = JsonValue::Object(serde_json::Map::new());
    for path in files {
        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        if content.trim().is_empty() {
            continue;
        }

        let value: JsonValue =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;

        if value.is_null() {
            continue;
        }
        if !value.is_object() {
            return Err(ConfigError::Parse {
                file: path.display().to_string(),
                message: "top level must be a mapping of API names".to_string(),
            });
        }

        deep_merge(&mut merged, value);
        debug!("Merged config file {}", path.display());
    }

    Ok(merged)
}

/// Recursive merge: mappings combine key-wise, everything else is replaced
fn deep_merge(base: &mut JsonValue, overlay: JsonValue) {
    match overlay {
        JsonValue::Object(overlay_map) => {
            if let JsonValue::Object(base_map) = base {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(slot) => deep_merge(slot, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            } else {
                *base = JsonValue::Object(overlay_map);
            }
        }
        other => *base = other,
    }
}

/// Restructures api → environment → fields into environment → api → fields
///
/// Files author an API per root key; lookup keys lead with the environment.
fn pivot_environment_first(merged: JsonValue) -> JsonValue {
    let mut pivoted = serde_json::Map::new();

    let apis = match merged {
        JsonValue::Object(apis) => apis,
        _ => return JsonValue::Object(pivoted),
    };

    for (api_name, environments) in apis {
        let environments = match environments {
            JsonValue::Object(map) => map,
            _ => {
                warn!(
                    "Config for '{}' is not a mapping of environments; skipping",
                    api_name
                );
                continue;
            }
        };

        for (env_name, fields) in environments {
            let env_slot = pivoted
                .entry(env_name)
                .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
            if let JsonValue::Object(env_map) = env_slot {
                env_map.insert(api_name.clone(), fields);
            }
        }
    }

    JsonValue::Object(pivoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn basic_fixture() -> (TempDir, ResolverSettings) {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            r#"
userApi:
  default:
    baseUri: https://example.com
    basePath: /api
    timeoutMs: 3000
  dev:
    baseUri: https://dev.example.com
"#,
        );
        write_file(dir.path(), "app.env", "env=dev\napi_key=secret123\n");
        let settings = ResolverSettings::new(dir.path())
            .with_env_file(dir.path().join("app.env"));
        (dir, settings)
    }

    #[test]
    fn test_primary_environment_wins() {
        let (_dir, settings) = basic_fixture();
        let resolver = ConfigResolver::new(settings);

        assert_eq!(resolver.primary_env(), "dev");
        assert_eq!(
            resolver.get_str("userApi", "baseUri"),
            Some("https://dev.example.com".to_string())
        );
    }

    #[test]
    fn test_fallback_environment_fills_gaps() {
        let (_dir, settings) = basic_fixture();
        let resolver = ConfigResolver::new(settings);

        // basePath only exists in the default tier
        assert_eq!(resolver.get_str("userApi", "basePath"), Some("/api".to_string()));
        assert_eq!(resolver.get_u64("userApi", "timeoutMs"), Some(3000));
    }

    #[test]
    fn test_unknown_field_is_none() {
        let (_dir, settings) = basic_fixture();
        let resolver = ConfigResolver::new(settings);
        assert_eq!(resolver.get("userApi", "nope"), None);
        assert_eq!(resolver.get("otherApi", "baseUri"), None);
    }

    #[test]
    fn test_empty_api_name_is_none() {
        let (_dir, settings) = basic_fixture();
        let resolver = ConfigResolver::new(settings);
        assert_eq!(resolver.get("", "baseUri"), None);
        assert_eq!(resolver.get("   ", "baseUri"), None);
    }

    #[test]
    fn test_falsy_primary_values_win() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            r#"
svc:
  default:
    token: "real-token"
    enabled: true
  dev:
    token: ""
    enabled: false
"#,
        );
        let resolver =
            ConfigResolver::new(ResolverSettings::new(dir.path()).with_primary_env("dev"));

        // Empty string and false are present values, not absences
        assert_eq!(resolver.get_str("svc", "token"), Some(String::new()));
        assert_eq!(resolver.get_bool("svc", "enabled"), Some(false));
    }

    #[test]
    fn test_null_primary_falls_back() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            r#"
svc:
  default:
    token: fallback-token
  dev:
    token: null
"#,
        );
        let resolver =
            ConfigResolver::new(ResolverSettings::new(dir.path()).with_primary_env("dev"));

        assert_eq!(resolver.get_str("svc", "token"), Some("fallback-token".to_string()));
    }

    #[test]
    fn test_nested_field_path() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            r#"
svc:
  default:
    retryOnError:
      maxCount: 4
      maxBackoffMs: 2000
"#,
        );
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));

        assert_eq!(resolver.get_u64("svc", "retryOnError.maxCount"), Some(4));
    }

    #[test]
    fn test_merge_last_file_wins() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "a.yaml",
            "svc:\n  default:\n    host: first\n    keep: yes-keep\n",
        );
        write_file(dir.path(), "b.yaml", "svc:\n  default:\n    host: second\n");
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));

        assert_eq!(resolver.get_str("svc", "host"), Some("second".to_string()));
        // Non-conflicting keys from the earlier file survive the merge
        assert_eq!(resolver.get_str("svc", "keep"), Some("yes-keep".to_string()));
    }

    #[test]
    fn test_apis_merge_across_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "user.yaml", "userApi:\n  default:\n    baseUri: u\n");
        write_file(dir.path(), "order.yaml", "orderApi:\n  default:\n    baseUri: o\n");
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));

        assert_eq!(resolver.get_str("userApi", "baseUri"), Some("u".to_string()));
        assert_eq!(resolver.get_str("orderApi", "baseUri"), Some("o".to_string()));
    }

    #[test]
    fn test_placeholder_substitution_from_env() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            "svc:\n  default:\n    auth: \"Bearer ${api_key}\"\n    where: \"${env}-zone\"\n",
        );
        write_file(dir.path(), "app.env", "env=qa\napi_key=secret123\n");
        let resolver = ConfigResolver::new(
            ResolverSettings::new(dir.path()).with_env_file(dir.path().join("app.env")),
        );

        assert_eq!(resolver.primary_env(), "qa");
        assert_eq!(
            resolver.get_str("svc", "auth"),
            Some("Bearer secret123".to_string())
        );
        assert_eq!(resolver.get_str("svc", "where"), Some("qa-zone".to_string()));
    }

    #[test]
    fn test_unresolved_placeholder_kept() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "apis.yaml", "svc:\n  default:\n    auth: \"${missing}\"\n");
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));

        assert_eq!(resolver.get_str("svc", "auth"), Some("${missing}".to_string()));
    }

    #[test]
    fn test_missing_config_dir_degrades_to_empty() {
        let resolver =
            ConfigResolver::new(ResolverSettings::new("/nonexistent/config/dir"));
        assert_eq!(resolver.get("svc", "anything"), None);
        assert_eq!(resolver.primary_env(), DEFAULT_ENVIRONMENT);
    }

    #[test]
    fn test_missing_env_file_still_loads_config() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "apis.yaml", "svc:\n  default:\n    host: h\n");
        let resolver = ConfigResolver::new(
            ResolverSettings::new(dir.path()).with_env_file(dir.path().join("gone.env")),
        );

        assert_eq!(resolver.get_str("svc", "host"), Some("h".to_string()));
        assert_eq!(resolver.primary_env(), DEFAULT_ENVIRONMENT);
    }

    #[test]
    fn test_malformed_yaml_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "bad.yaml", "svc:\n  default: [unclosed\n");
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));
        assert_eq!(resolver.get("svc", "host"), None);
    }

    #[test]
    fn test_non_yaml_files_ignored() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "apis.yaml", "svc:\n  default:\n    host: h\n");
        write_file(dir.path(), "notes.txt", "not yaml at all {{{");
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));
        assert_eq!(resolver.get_str("svc", "host"), Some("h".to_string()));
    }

    #[test]
    fn test_get_string_map() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "apis.yaml",
            "svc:\n  default:\n    headers:\n      X-Key: abc\n      X-Num: 7\n",
        );
        let resolver = ConfigResolver::new(ResolverSettings::new(dir.path()));
        let headers = resolver.get_string_map("svc", "headers").unwrap();
        assert_eq!(headers.get("X-Key"), Some(&"abc".to_string()));
        assert_eq!(headers.get("X-Num"), Some(&"7".to_string()));
    }

    #[test]
    fn test_dump_snapshot() {
        let (_dir, settings) = basic_fixture();
        let resolver = ConfigResolver::new(settings);
        let out = TempDir::new().unwrap();

        resolver.dump_snapshot(out.path()).unwrap();

        let yaml = fs::read_to_string(out.path().join("resolved-config.yaml")).unwrap();
        assert!(yaml.contains("dev.example.com"));
        let json = fs::read_to_string(out.path().join("resolved-config.json")).unwrap();
        let root: JsonValue = serde_json::from_str(&json).unwrap();
        assert_eq!(root["dev"]["userApi"]["baseUri"], json!("https://dev.example.com"));
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut base = json!({"a": {"list": [1, 2, 3]}});
        deep_merge(&mut base, json!({"a": {"list": [9]}}));
        assert_eq!(base, json!({"a": {"list": [9]}}));
    }

    #[test]
    fn test_pivot_layout() {
        let merged = json!({
            "userApi": {"dev": {"x": 1}, "default": {"x": 2}},
            "orderApi": {"dev": {"y": 3}}
        });
        let pivoted = pivot_environment_first(merged);
        assert_eq!(pivoted["dev"]["userApi"]["x"], json!(1));
        assert_eq!(pivoted["dev"]["orderApi"]["y"], json!(3));
        assert_eq!(pivoted["default"]["userApi"]["x"], json!(2));
    }
}
