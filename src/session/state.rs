//! Mutable request state for a test scenario.
//!
//! A [`RequestState`] is the working object a test step composes: it is
//! seeded from an API's configuration entry, mutated through merge-mode
//! table operations and path-addressed body edits, executed, and then
//! holds the response for validation. Each state carries its own
//! correlation id so interleaved scenarios stay distinguishable in logs.

use crate::config::ConfigResolver;
use crate::document::{self, path as document_path, DocumentError, FieldValue};
use crate::models::{ApiResponse, HttpMethod, ProxySettings, RequestSpec, RetrySettings};
use crate::session::merge::{merge_map, MergeMode};
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// The request under construction for one scenario step.
#[derive(Debug, Clone)]
pub struct RequestState {
    correlation_id: String,
    api_name: Option<String>,
    spec: RequestSpec,
    last_response: Option<ApiResponse>,
}

impl RequestState {
    /// Creates an empty state with a fresh correlation id.
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            api_name: None,
            spec: RequestSpec::default(),
            last_response: None,
        }
    }

    /// The id used to correlate this request with its response and logs.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The API entry this state was seeded from, if any.
    pub fn api_name(&self) -> Option<&str> {
        self.api_name.as_deref()
    }

    /// The request description as currently composed.
    pub fn request(&self) -> &RequestSpec {
        &self.spec
    }

    /// Mutable access to the request description.
    pub fn request_mut(&mut self) -> &mut RequestSpec {
        &mut self.spec
    }

    /// Seeds the request from an API's configuration entry.
    ///
    /// Every field is looked up independently, so values missing from the
    /// primary environment fall back per field rather than per entry.
    /// Tables merge in `Update` mode; values set on the state beforehand
    /// survive unless the configuration names the same key.
    ///
    /// # Arguments
    ///
    /// * `resolver` - The configuration to read from
    /// * `api_name` - Root key of the API entry, e.g. `userApi`
    pub fn apply_config(&mut self, resolver: &ConfigResolver, api_name: &str) {
        self.api_name = Some(api_name.to_string());

        if let Some(value) = resolver.get_str(api_name, "baseUri") {
            self.spec.base_uri = Some(value);
        }
        if let Some(value) = resolver.get_str(api_name, "basePath") {
            self.spec.base_path = Some(value);
        }
        if let Some(value) = resolver.get_str(api_name, "endpoint") {
            self.spec.endpoint = Some(value);
        }
        if let Some(value) = resolver.get_u64(api_name, "timeoutMs") {
            self.spec.timeout_ms = Some(value);
        }
        if let Some(name) = resolver.get_str(api_name, "method") {
            match HttpMethod::parse(&name) {
                Some(method) => self.spec.method = method,
                None => warn!("Ignoring unknown method '{}' for '{}'", name, api_name),
            }
        }

        if let Some(map) = resolver.get_string_map(api_name, "headers") {
            merge_map(&mut self.spec.headers, map, MergeMode::Update);
        }
        if let Some(map) = resolver.get_string_map(api_name, "queryParams") {
            merge_map(&mut self.spec.query_params, map, MergeMode::Update);
        }
        if let Some(map) = resolver.get_string_map(api_name, "formParams") {
            merge_map(&mut self.spec.form_params, map, MergeMode::Update);
        }
        if let Some(map) = resolver.get_string_map(api_name, "pathParams") {
            merge_map(&mut self.spec.path_params, map, MergeMode::Update);
        }
        if let Some(map) = resolver.get_string_map(api_name, "cookies") {
            merge_map(&mut self.spec.cookies, map, MergeMode::Update);
        }

        if let Some(body) = resolver.get_rendered(api_name, "body") {
            self.spec.body = Some(body);
        }

        if let Some(value) = resolver.get(api_name, "proxy") {
            match serde_json::from_value::<ProxySettings>(value) {
                Ok(proxy) => self.spec.proxy = Some(proxy),
                Err(e) => warn!("Ignoring malformed proxy settings for '{}': {}", api_name, e),
            }
        }
        if let Some(value) = resolver.get(api_name, "retryOnError") {
            match serde_json::from_value::<RetrySettings>(value) {
                Ok(retry) => self.spec.retry = Some(retry),
                Err(e) => warn!("Ignoring malformed retry settings for '{}': {}", api_name, e),
            }
        }

        debug!(
            "Applied '{}' configuration to request {}",
            api_name, self.correlation_id
        );
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.spec.method = method;
    }

    pub fn set_base_uri(&mut self, base_uri: impl Into<String>) {
        self.spec.base_uri = Some(base_uri.into());
    }

    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.spec.base_path = Some(base_path.into());
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.spec.endpoint = Some(endpoint.into());
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.spec.timeout_ms = Some(timeout_ms);
    }

    /// Replaces the raw body text.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.spec.body = Some(body.into());
    }

    pub fn clear_body(&mut self) {
        self.spec.body = None;
    }

    /// Merges entries into the header table.
    pub fn merge_headers(&mut self, entries: HashMap<String, String>, mode: MergeMode) {
        merge_map(&mut self.spec.headers, entries, mode);
    }

    /// Merges entries into the query-parameter table.
    pub fn merge_query_params(&mut self, entries: HashMap<String, String>, mode: MergeMode) {
        merge_map(&mut self.spec.query_params, entries, mode);
    }

    /// Merges entries into the form-parameter table.
    pub fn merge_form_params(&mut self, entries: HashMap<String, String>, mode: MergeMode) {
        merge_map(&mut self.spec.form_params, entries, mode);
    }

    /// Merges entries into the path-parameter table.
    pub fn merge_path_params(&mut self, entries: HashMap<String, String>, mode: MergeMode) {
        merge_map(&mut self.spec.path_params, entries, mode);
    }

    /// Merges entries into the cookie table.
    pub fn merge_cookies(&mut self, entries: HashMap<String, String>, mode: MergeMode) {
        merge_map(&mut self.spec.cookies, entries, mode);
    }

    /// Applies a typed update to the body document.
    ///
    /// An absent or blank body starts as an empty JSON object, so a test
    /// can build a payload entirely through path updates.
    pub fn mutate_body(&mut self, path: &str, value: &FieldValue) -> Result<(), DocumentError> {
        let body = match &self.spec.body {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => "{}".to_string(),
        };
        let updated = document::update(&body, path, value)?;
        self.spec.body = Some(updated);
        Ok(())
    }

    /// Removes a path from the body document.
    ///
    /// Deleting from an absent body is a no-op, but the path must still
    /// be well-formed.
    pub fn delete_body_path(&mut self, path: &str) -> Result<(), DocumentError> {
        let body = match &self.spec.body {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => {
                document_path::parse(path)?;
                return Ok(());
            }
        };
        let updated = document::delete(&body, path)?;
        self.spec.body = Some(updated);
        Ok(())
    }

    /// Reads a value out of the body document by path.
    pub fn read_body(&self, path: &str) -> Result<String, DocumentError> {
        match &self.spec.body {
            Some(text) if !text.trim().is_empty() => document::read(text, path),
            _ => Err(DocumentError::InvalidDocument(
                "request has no body".to_string(),
            )),
        }
    }

    /// Stores the response produced by executing this request.
    pub fn record_response(&mut self, response: ApiResponse) {
        self.last_response = Some(response);
    }

    /// The most recent response, if the request has executed.
    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }

    /// Clears everything back to a fresh state with a new correlation id.
    pub fn reset(&mut self) {
        self.correlation_id = Uuid::new_v4().to_string();
        self.api_name = None;
        self.spec = RequestSpec::default();
        self.last_response = None;
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::new()
    }
}
