//! Data models for API requests and responses.
//!
//! This module contains the core data structures used throughout the
//! harness for describing outgoing requests, their execution settings,
//! and the responses that come back.

pub mod request;
pub mod response;

pub use request::{HttpMethod, ProxySettings, RequestSpec, RetrySettings};
pub use response::ApiResponse;
