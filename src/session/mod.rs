//! Scenario session context.
//!
//! A [`TestSession`] is the explicit handle a test suite passes around:
//! it owns the configuration resolver and hands out [`RequestState`]s
//! seeded from API entries. Sessions clone cheaply; parallel scenarios
//! share one resolver while composing independent requests.

pub mod merge;
pub mod state;

pub use merge::{merge_map, MergeMode, MergeModeError};
pub use state::RequestState;

use crate::config::{ConfigResolver, ResolverSettings};
use crate::executor::{self, RequestError};
use crate::models::ApiResponse;
use std::sync::Arc;

/// Shared context for one test run.
#[derive(Debug, Clone)]
pub struct TestSession {
    resolver: Arc<ConfigResolver>,
}

impl TestSession {
    /// Builds a session with its own resolver from the given settings.
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            resolver: Arc::new(ConfigResolver::new(settings)),
        }
    }

    /// Wraps an already shared resolver.
    pub fn from_resolver(resolver: Arc<ConfigResolver>) -> Self {
        Self { resolver }
    }

    /// The configuration behind this session.
    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Creates a request state seeded from an API's configuration entry.
    ///
    /// # Arguments
    ///
    /// * `api_name` - Root key of the API entry, e.g. `userApi`
    pub fn new_request(&self, api_name: &str) -> RequestState {
        let mut state = RequestState::new();
        state.apply_config(&self.resolver, api_name);
        state
    }

    /// Executes a request state and records the response on it.
    ///
    /// Transport failures retry per the request's retry settings; an HTTP
    /// response of any status is final and is never retried.
    pub fn execute(&self, state: &mut RequestState) -> Result<ApiResponse, RequestError> {
        let response = executor::execute_with_retry(state.request(), state.correlation_id())?;
        state.record_response(response.clone());
        Ok(response)
    }
}
