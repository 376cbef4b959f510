//! HTTP request data models.
//!
//! This module defines the core data structures describing an outgoing API
//! request: the method, address parts, parameter tables, body, and the
//! proxy and retry settings that govern execution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Parses a string into an HttpMethod.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice representing the HTTP method
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a valid HTTP method, `None` otherwise.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::GET
    }
}

/// Proxy settings for a request.
///
/// Mirrors the `proxy` block of an API configuration entry. A disabled
/// proxy is carried along but ignored at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    /// Whether the proxy should actually be used.
    #[serde(default = "default_proxy_enabled")]
    pub enabled: bool,

    /// Proxy URL, e.g. `http://proxy.internal:8080`.
    pub url: String,

    /// Optional basic-auth username for the proxy.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password for the proxy.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_proxy_enabled() -> bool {
    true
}

impl ProxySettings {
    /// Creates enabled proxy settings for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Attaches basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Retry settings for a request.
///
/// Retries apply to transport failures only; an HTTP response of any
/// status is a completed request and is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySettings {
    /// Whether retries are performed at all.
    #[serde(default = "default_retry_enabled")]
    pub enabled: bool,

    /// Maximum number of attempts after the first failure.
    #[serde(default = "default_retry_count")]
    pub max_count: u32,

    /// Upper bound on the exponential backoff delay, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_retry_enabled() -> bool {
    true
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            enabled: default_retry_enabled(),
            max_count: default_retry_count(),
            max_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// A fully described API request, ready to execute.
///
/// The target URL is assembled from `base_uri`, `base_path`, and
/// `endpoint`; `{name}` tokens in any of the three are filled from
/// `path_params`. The parameter tables are plain string maps so they can
/// be merged from configuration and mutated by test steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestSpec {
    /// HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: HttpMethod,

    /// Scheme and authority, e.g. `https://api.example.com`.
    pub base_uri: Option<String>,

    /// Path prefix shared by every endpoint of the API, e.g. `/v2`.
    pub base_path: Option<String>,

    /// Endpoint path, e.g. `/users/{userId}`.
    pub endpoint: Option<String>,

    /// Values for `{name}` tokens in the URL parts.
    pub path_params: HashMap<String, String>,

    /// Query-string parameters.
    pub query_params: HashMap<String, String>,

    /// Form parameters, sent urlencoded when no raw body is set.
    pub form_params: HashMap<String, String>,

    /// Request headers as key-value pairs.
    pub headers: HashMap<String, String>,

    /// Cookies, joined into a single `Cookie` header at execution time.
    pub cookies: HashMap<String, String>,

    /// Optional raw request body (JSON, XML, or plain text).
    pub body: Option<String>,

    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Optional proxy settings.
    pub proxy: Option<ProxySettings>,

    /// Optional retry settings for transport failures.
    #[serde(rename = "retryOnError")]
    pub retry: Option<RetrySettings>,
}

impl RequestSpec {
    /// Creates an empty request for the given method.
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Checks if the request has a non-empty raw body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().map_or(false, |b| !b.is_empty())
    }

    /// Gets the Content-Type header value if present.
    ///
    /// Header lookup is case-insensitive.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }
}
