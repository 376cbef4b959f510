//! REST API test harness core.
//!
//! Building blocks for API test suites: environment-aware configuration,
//! path-addressed JSON/XML document editing, composable request state, a
//! blocking HTTP executor with transport-failure retry, and response
//! validators with readable difference reports.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **config**: Loads and merges YAML configuration, substitutes `${name}`
//!   placeholders, and answers `"{env}.{api}.{field}"` lookups with a
//!   primary-then-fallback environment search
//! - **document**: One path vocabulary over JSON and XML documents, with
//!   read, update, and delete routed on sniffed content kind
//! - **models**: Data structures for requests, execution settings, and
//!   responses
//! - **session**: Explicit test context handing out request states seeded
//!   from configuration
//! - **executor**: Blocking HTTP execution with URL assembly, proxies, and
//!   retry on transport failures
//! - **validator**: Field assertions under comparison operations and
//!   whole-body diffs
//!
//! # Usage
//!
//! ```no_run
//! use rest_harness::config::ResolverSettings;
//! use rest_harness::session::{MergeMode, TestSession};
//! use rest_harness::validator::{self, CompareOp};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = TestSession::new(
//!     ResolverSettings::new("config").with_env_file("config/app.env"),
//! );
//!
//! let mut request = session.new_request("userApi");
//! request.set_endpoint("/users/{userId}");
//! request.merge_path_params(
//!     HashMap::from([("userId".to_string(), "42".to_string())]),
//!     MergeMode::Update,
//! );
//!
//! let response = session.execute(&mut request)?;
//! validator::assert_status(&response, 200)?;
//! validator::assert_response_field(&response, "name", CompareOp::Equal, &json!("Ada"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod executor;
pub mod models;
pub mod session;
pub mod validator;

pub use config::{ConfigResolver, ResolverSettings};
pub use document::{ContentKind, DocumentError, FieldKind, FieldValue};
pub use executor::RequestError;
pub use models::{ApiResponse, HttpMethod, RequestSpec};
pub use session::{MergeMode, RequestState, TestSession};
pub use validator::{CompareOp, ValidationError};
