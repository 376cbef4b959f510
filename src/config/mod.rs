//! Environment-aware configuration for test suites.
//!
//! This module loads a directory of YAML configuration files, merges them
//! into one document, substitutes `${name}` placeholders from an
//! environment-definition file, and answers `"{env}.{api}.{field}"`
//! lookups with a primary-then-fallback environment search. All state
//! lives in an explicit [`ConfigResolver`] handle so independent suites
//! can run against different environments in the same process.

pub mod document;
pub mod env_file;
pub mod placeholder;
pub mod resolver;

pub use document::DocumentStore;
pub use env_file::{load_env_file, EnvFileError, EnvironmentMap};
pub use placeholder::{MissingKeyMode, VALUE_NOT_SET};
pub use resolver::{ConfigError, ConfigResolver, ResolverSettings, DEFAULT_ENVIRONMENT};
