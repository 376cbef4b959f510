//! Blocking HTTP request execution.
//!
//! This module turns a [`RequestSpec`] into an HTTP exchange: the URL is
//! assembled from the address parts with `{name}` path parameters filled
//! in, tables become headers, query string, cookies, and form fields, and
//! the response is captured whole. Execution is synchronous; scenario
//! steps run one request at a time.

pub mod error;
pub mod retry;

pub use error::RequestError;
pub use retry::execute_with_retry;

use crate::models::{ApiResponse, HttpMethod, RequestSpec};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

/// Timeout applied when the request does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Matches `{name}` path-parameter tokens in URL parts.
static PATH_PARAM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}/]+)\}").expect("Failed to compile path parameter regex"));

/// Assembles the target URL for a request.
///
/// Joins `base_uri`, `base_path`, and `endpoint` with single slashes and
/// fills `{name}` tokens from the path-parameter table. Tokens with no
/// matching parameter are left in place and logged.
///
/// # Arguments
///
/// * `spec` - The request description
///
/// # Returns
///
/// The parsed URL, or a [`RequestError`] when no base URI is set or the
/// assembled text is not a valid URL.
pub fn build_url(spec: &RequestSpec) -> Result<Url, RequestError> {
    let base_uri = spec
        .base_uri
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RequestError::BuildError("request has no baseUri".to_string()))?;

    let mut address = base_uri.trim_end_matches('/').to_string();
    if let Some(base_path) = &spec.base_path {
        push_url_part(&mut address, base_path);
    }
    if let Some(endpoint) = &spec.endpoint {
        push_url_part(&mut address, endpoint);
    }

    let filled = fill_path_params(&address, &spec.path_params);
    Ok(Url::parse(&filled)?)
}

/// Appends a path part, collapsing the joining slashes to one.
fn push_url_part(address: &mut String, part: &str) {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return;
    }
    while address.ends_with('/') {
        address.pop();
    }
    if !trimmed.starts_with('/') {
        address.push('/');
    }
    address.push_str(trimmed);
}

/// Replaces `{name}` tokens with values from the path-parameter table.
fn fill_path_params(address: &str, params: &HashMap<String, String>) -> String {
    if !address.contains('{') {
        return address.to_string();
    }

    let mut result = String::with_capacity(address.len());
    let mut last_end = 0;
    for captures in PATH_PARAM_REGEX.captures_iter(address) {
        let full = match captures.get(0) {
            Some(m) => m,
            None => continue,
        };
        let name = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");

        result.push_str(&address[last_end..full.start()]);
        match params.get(name) {
            Some(value) => result.push_str(value),
            None => {
                warn!("No value for path parameter '{{{}}}' in {}", name, address);
                result.push_str(full.as_str());
            }
        }
        last_end = full.end();
    }
    result.push_str(&address[last_end..]);
    result
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::HEAD => reqwest::Method::HEAD,
    }
}

/// Executes one request attempt.
///
/// Any HTTP response, whatever its status code, is a successful
/// execution; errors are reserved for requests that never completed.
///
/// # Arguments
///
/// * `spec` - The request description
/// * `correlation_id` - Id stamped on the response and every log line
pub fn execute(spec: &RequestSpec, correlation_id: &str) -> Result<ApiResponse, RequestError> {
    let url = build_url(spec)?;

    let timeout = Duration::from_millis(spec.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
    let mut builder = Client::builder().timeout(timeout);

    if let Some(proxy) = &spec.proxy {
        if proxy.enabled {
            let mut configured = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| RequestError::BuildError(format!("invalid proxy: {}", e)))?;
            if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
                configured = configured.basic_auth(user, pass);
            }
            builder = builder.proxy(configured);
        }
    }

    let client = builder
        .build()
        .map_err(|e| RequestError::BuildError(e.to_string()))?;

    let mut request = client.request(to_reqwest_method(spec.method), url.clone());

    for (name, value) in &spec.headers {
        request = request.header(name, value);
    }

    if !spec.cookies.is_empty() {
        let mut pairs: Vec<(&str, &str)> = spec
            .cookies
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort();
        let cookie_header = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        request = request.header("Cookie", cookie_header);
    }

    if !spec.query_params.is_empty() {
        let mut pairs: Vec<(&str, &str)> = spec
            .query_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort();
        request = request.query(&pairs);
    }

    // A raw body wins over form params when both are set.
    if let Some(body) = &spec.body {
        request = request.body(body.clone());
    } else if !spec.form_params.is_empty() {
        request = request.form(&spec.form_params);
    }

    debug!("[{}] {} {}", correlation_id, spec.method, url);
    let start = Instant::now();
    let response = request.send()?;

    let status_code = response.status().as_u16();
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_string();

    let mut headers = HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(value_str) = value.to_str() {
            headers.insert(name.as_str().to_string(), value_str.to_string());
        }
    }

    let body = response.bytes()?.to_vec();
    let duration = start.elapsed();

    debug!(
        "[{}] {} in {:?} ({} bytes)",
        correlation_id,
        status_code,
        duration,
        body.len()
    );

    let mut api_response = ApiResponse::new(correlation_id.to_string(), status_code, status_text);
    api_response.headers = headers;
    api_response.set_body(body);
    api_response.duration = duration;
    Ok(api_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_url_parts(
        base_uri: Option<&str>,
        base_path: Option<&str>,
        endpoint: Option<&str>,
    ) -> RequestSpec {
        let mut spec = RequestSpec::new(HttpMethod::GET);
        spec.base_uri = base_uri.map(str::to_string);
        spec.base_path = base_path.map(str::to_string);
        spec.endpoint = endpoint.map(str::to_string);
        spec
    }

    #[test]
    fn test_build_url_joins_parts() {
        let spec = spec_with_url_parts(Some("https://api.example.com"), Some("/v2"), Some("/users"));
        assert_eq!(
            build_url(&spec).unwrap().as_str(),
            "https://api.example.com/v2/users"
        );
    }

    #[test]
    fn test_build_url_collapses_slashes() {
        let spec = spec_with_url_parts(Some("https://api.example.com/"), Some("v2/"), Some("users"));
        assert_eq!(
            build_url(&spec).unwrap().as_str(),
            "https://api.example.com/v2/users"
        );
    }

    #[test]
    fn test_build_url_without_base_uri_fails() {
        let spec = spec_with_url_parts(None, Some("/v2"), Some("/users"));
        assert!(matches!(build_url(&spec), Err(RequestError::BuildError(_))));
    }

    #[test]
    fn test_build_url_fills_path_params() {
        let mut spec = spec_with_url_parts(
            Some("https://api.example.com"),
            None,
            Some("/users/{userId}/orders/{orderId}"),
        );
        spec.path_params.insert("userId".to_string(), "42".to_string());
        spec.path_params.insert("orderId".to_string(), "a-1".to_string());

        assert_eq!(
            build_url(&spec).unwrap().as_str(),
            "https://api.example.com/users/42/orders/a-1"
        );
    }

    #[test]
    fn test_build_url_keeps_unfilled_params() {
        let spec =
            spec_with_url_parts(Some("https://api.example.com"), None, Some("/users/{userId}"));
        let url = build_url(&spec).unwrap();
        assert!(url.as_str().contains("userId"));
    }

    #[test]
    fn test_build_url_invalid_base() {
        let spec = spec_with_url_parts(Some("not a url"), None, None);
        assert!(matches!(build_url(&spec), Err(RequestError::InvalidUrl(_))));
    }

    #[test]
    fn test_fill_path_params_no_tokens() {
        let params = HashMap::new();
        assert_eq!(fill_path_params("/plain/path", &params), "/plain/path");
    }

    #[test]
    fn test_push_url_part_empty_ignored() {
        let mut address = "https://x".to_string();
        push_url_part(&mut address, "   ");
        assert_eq!(address, "https://x");
    }
}
