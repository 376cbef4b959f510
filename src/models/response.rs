//! HTTP response data models.
//!
//! This module defines the core data structures for representing HTTP
//! responses, including status information, headers, body, timing, and
//! path-addressed access into the body document.

use crate::document::{self, ContentKind, DocumentError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;

/// Represents an HTTP response received from a server.
///
/// This structure contains all the information about an HTTP response,
/// including status code, headers, body, and the id of the request that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Identifier of the request that produced this response.
    ///
    /// Matches the correlation id of the request state that executed.
    pub request_id: String,

    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// HTTP status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Response headers as key-value pairs.
    pub headers: HashMap<String, String>,

    /// Response body as raw bytes.
    ///
    /// `Vec<u8>` rather than `String` so binary responses survive intact.
    pub body: Vec<u8>,

    /// Total request duration from send to complete body.
    pub duration: Duration,

    /// Total response size in bytes, headers included.
    pub size: usize,
}

impl ApiResponse {
    /// Creates a new ApiResponse with the given status code and text.
    ///
    /// # Arguments
    ///
    /// * `request_id` - Correlation id of the originating request
    /// * `status_code` - HTTP status code
    /// * `status_text` - HTTP status text description
    pub fn new(request_id: String, status_code: u16, status_text: String) -> Self {
        Self {
            request_id,
            status_code,
            status_text,
            headers: HashMap::new(),
            body: Vec::new(),
            duration: Duration::from_secs(0),
            size: 0,
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Checks if the response status indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Checks if the response status indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Checks if the response status indicates a redirection (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
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

    /// Gets a response header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attempts to parse the response body as UTF-8 text.
    pub fn body_as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Sniffs the body content kind from its first significant byte.
    pub fn body_kind(&self) -> ContentKind {
        match std::str::from_utf8(&self.body) {
            Ok(text) => ContentKind::sniff(text),
            Err(_) => ContentKind::Unknown,
        }
    }

    /// Reads one value out of the body by path.
    ///
    /// The body format (JSON or XML) is detected from the content itself.
    ///
    /// # Arguments
    ///
    /// * `path` - Dot path into the body, e.g. `data.items[0].id`
    ///
    /// # Returns
    ///
    /// The rendered value at the path, or a [`DocumentError`] when the
    /// body is not a recognized document or the path does not resolve.
    pub fn read_path(&self, path: &str) -> Result<String, DocumentError> {
        let text = self
            .body_as_string()
            .map_err(|e| DocumentError::InvalidDocument(e.to_string()))?;
        document::read(&text, path)
    }

    /// Parses a JSON body into a [`JsonValue`].
    pub fn body_json(&self) -> Result<JsonValue, DocumentError> {
        let text = self
            .body_as_string()
            .map_err(|e| DocumentError::InvalidDocument(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| DocumentError::InvalidDocument(e.to_string()))
    }

    /// Adds a header to the response.
    pub fn add_header(&mut self, name: String, value: String) {
        self.headers.insert(name, value);
    }

    /// Sets the response body and recomputes the total size.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.size = self.calculate_headers_size() + body.len();
        self.body = body;
    }

    /// Calculates the approximate size of headers in bytes.
    fn calculate_headers_size(&self) -> usize {
        self.headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4) // +4 for ": " and "\r\n"
            .sum()
    }
}
