//! HTTP request execution error types.
//!
//! This module defines error types that can occur during request
//! execution, including network errors, timeouts, and protocol issues.
//! The taxonomy also decides what the retry loop may attempt again.

use std::fmt;

/// Errors that can occur during request execution.
///
/// Provides detailed error information to help diagnose issues with an
/// API request. A completed HTTP exchange is never an error here, whatever
/// its status code.
#[derive(Debug)]
pub enum RequestError {
    /// Network error occurred during request execution.
    ///
    /// This includes connection failures, DNS resolution errors,
    /// and other network-level issues.
    NetworkError(String),

    /// Request timed out before completion.
    ///
    /// Occurs when the request takes longer than the configured timeout.
    Timeout,

    /// The assembled URL could not be parsed or is malformed.
    InvalidUrl(String),

    /// TLS/SSL error occurred during HTTPS connection.
    ///
    /// This includes certificate validation errors, handshake failures,
    /// and other TLS-related issues.
    TlsError(String),

    /// HTTP protocol error.
    ///
    /// The exchange broke at the protocol level, such as a redirect
    /// loop or an exceeded redirect limit.
    ProtocolError(String),

    /// Request building error.
    ///
    /// Errors that occur when constructing the HTTP request from the
    /// request description, including missing address parts.
    BuildError(String),
}

impl RequestError {
    /// Whether the retry loop may attempt the request again.
    ///
    /// Only transient transport failures qualify; build, URL, TLS, and
    /// protocol errors are deterministic and fail immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::NetworkError(_) | RequestError::Timeout)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RequestError::Timeout => write!(f, "Request timed out"),
            RequestError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            RequestError::TlsError(msg) => write!(f, "TLS/SSL error: {}", msg),
            RequestError::ProtocolError(msg) => write!(f, "HTTP protocol error: {}", msg),
            RequestError::BuildError(msg) => write!(f, "Request build error: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {}

/// Convert reqwest errors to RequestError.
///
/// Maps reqwest's error types to our custom error variants for consistent
/// error handling throughout the harness.
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_redirect() {
            RequestError::ProtocolError(err.to_string())
        } else if err.is_connect() || err.is_request() {
            RequestError::NetworkError(err.to_string())
        } else if err.is_builder() {
            RequestError::BuildError(err.to_string())
        } else if err.to_string().contains("certificate")
            || err.to_string().contains("TLS")
            || err.to_string().contains("SSL")
        {
            RequestError::TlsError(err.to_string())
        } else {
            RequestError::NetworkError(err.to_string())
        }
    }
}

/// Convert URL parsing errors to RequestError.
impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}
