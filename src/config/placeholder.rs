//! Placeholder substitution engine for configuration text
//!
//! Replaces ${name} tokens in serialized configuration with values from a
//! key-value map. Substitution is a single pass: values that themselves
//! contain ${...} tokens are inserted verbatim and never re-expanded.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Sentinel inserted for unresolvable tokens when [`MissingKeyMode::Sentinel`]
/// is selected.
pub const VALUE_NOT_SET: &str = "VALUE_NOT_SET";

/// Cached regex pattern for matching ${name} tokens.
/// Compiled once and reused to avoid repeated regex compilation overhead.
static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Failed to compile placeholder regex"));

/// Policy for tokens whose name has no entry in the value map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKeyMode {
    /// Leave the literal `${name}` token in the output.
    KeepToken,
    /// Replace the token with the [`VALUE_NOT_SET`] sentinel.
    Sentinel,
}

/// Substitutes all ${name} tokens in the input text with values from `vars`
///
/// Names are matched case-insensitively; an exact-case entry wins over a
/// case-variant one. Tokens with no matching entry are handled according to
/// `mode`. Text without any `${` marker is returned unchanged, and malformed
/// fragments (an unterminated `${name` or an empty `${}`) never match the
/// token pattern, so they pass through as-is.
///
/// # Examples
///
/// ```
/// use rest_harness::config::placeholder::{replace, MissingKeyMode};
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("host".to_string(), "api.example.com".to_string());
///
/// let out = replace("https://${host}/users", &vars, MissingKeyMode::KeepToken);
/// assert_eq!(out, "https://api.example.com/users");
/// ```
pub fn replace(text: &str, vars: &HashMap<String, String>, mode: MissingKeyMode) -> String {
    // Fast path: no token marker anywhere in the text
    if !text.contains("${") {
        return text.to_string();
    }

    // Case-insensitive lookup index, built in sorted key order so that a
    // collision between case-variant keys resolves deterministically.
    let mut sorted_keys: Vec<&String> = vars.keys().collect();
    sorted_keys.sort();
    let mut lowered: HashMap<String, &str> = HashMap::with_capacity(vars.len());
    for key in sorted_keys {
        lowered.insert(key.to_ascii_lowercase(), vars[key].as_str());
    }

    let re = &*TOKEN_REGEX;

    let mut result = String::with_capacity(text.len() + (text.len() / 4));
    let mut last_match_end = 0;

    for cap in re.captures_iter(text) {
        let full_match = cap.get(0).expect("capture 0 always present");
        let name = cap.get(1).expect("capture 1 always present").as_str().trim();

        // Add text before this match
        result.push_str(&text[last_match_end..full_match.start()]);

        let resolved = vars
            .get(name)
            .map(|v| v.as_str())
            .or_else(|| lowered.get(&name.to_ascii_lowercase()).copied());

        match resolved {
            Some(value) => {
                debug!("Substituted placeholder '{}'", name);
                result.push_str(value);
            }
            None => match mode {
                MissingKeyMode::KeepToken => result.push_str(full_match.as_str()),
                MissingKeyMode::Sentinel => {
                    debug!("No value for placeholder '{}', inserting sentinel", name);
                    result.push_str(VALUE_NOT_SET);
                }
            },
        }

        last_match_end = full_match.end();
    }

    // Add remaining text after last match
    result.push_str(&text[last_match_end..]);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("host".to_string(), "api.example.com".to_string());
        vars.insert("port".to_string(), "8080".to_string());
        vars.insert("apiKey".to_string(), "secret-key-123".to_string());
        vars
    }

    #[test]
    fn test_simple_substitution() {
        let vars = sample_vars();
        let result = replace("GET https://${host}/users", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "GET https://api.example.com/users");
    }

    #[test]
    fn test_multiple_tokens() {
        let vars = sample_vars();
        let result = replace(
            "https://${host}:${port}/api?key=${apiKey}",
            &vars,
            MissingKeyMode::KeepToken,
        );
        assert_eq!(result, "https://api.example.com:8080/api?key=secret-key-123");
    }

    #[test]
    fn test_same_token_twice() {
        let vars = sample_vars();
        let result = replace("${host} and ${host}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "api.example.com and api.example.com");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let vars = sample_vars();
        let result = replace("key=${APIKEY}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "key=secret-key-123");
    }

    #[test]
    fn test_exact_case_wins_over_variant() {
        let mut vars = HashMap::new();
        vars.insert("Path".to_string(), "exact".to_string());
        vars.insert("path".to_string(), "lower".to_string());
        let result = replace("${Path}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "exact");
    }

    #[test]
    fn test_missing_key_kept() {
        let vars = sample_vars();
        let result = replace("value=${missing}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "value=${missing}");
    }

    #[test]
    fn test_missing_key_sentinel() {
        let vars = sample_vars();
        let result = replace("value=${missing}", &vars, MissingKeyMode::Sentinel);
        assert_eq!(result, format!("value={}", VALUE_NOT_SET));
    }

    #[test]
    fn test_missing_key_on_empty_map() {
        let vars = HashMap::new();
        let result = replace("${missing}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "${missing}");
    }

    #[test]
    fn test_single_pass_no_recursion() {
        let mut vars = sample_vars();
        vars.insert("outer".to_string(), "${host}".to_string());
        // The substituted value still contains a token; it must not expand again.
        let result = replace("url=${outer}", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "url=${host}");
    }

    #[test]
    fn test_unbalanced_braces_pass_through() {
        let vars = sample_vars();
        let result = replace("broken ${host text", &vars, MissingKeyMode::Sentinel);
        assert_eq!(result, "broken ${host text");
    }

    #[test]
    fn test_empty_token_passes_through() {
        let vars = sample_vars();
        let result = replace("odd ${} token", &vars, MissingKeyMode::Sentinel);
        assert_eq!(result, "odd ${} token");
    }

    #[test]
    fn test_whitespace_around_name() {
        let vars = sample_vars();
        let result = replace("h=${ host }", &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, "h=api.example.com");
    }

    #[test]
    fn test_empty_text() {
        let vars = sample_vars();
        assert_eq!(replace("", &vars, MissingKeyMode::KeepToken), "");
    }

    #[test]
    fn test_no_tokens() {
        let vars = sample_vars();
        let text = "GET https://example.com/users";
        assert_eq!(replace(text, &vars, MissingKeyMode::KeepToken), text);
    }

    #[test]
    fn test_empty_value_is_substituted() {
        let mut vars = HashMap::new();
        vars.insert("empty".to_string(), String::new());
        let result = replace("[${empty}]", &vars, MissingKeyMode::Sentinel);
        assert_eq!(result, "[]");
    }

    #[test]
    fn test_token_inside_json_body() {
        let vars = sample_vars();
        let text = r#"{"host": "${host}", "key": "${apiKey}"}"#;
        let result = replace(text, &vars, MissingKeyMode::KeepToken);
        assert_eq!(result, r#"{"host": "api.example.com", "key": "secret-key-123"}"#);
    }

    #[test]
    fn test_mixed_resolved_and_missing() {
        let vars = sample_vars();
        let result = replace("${host}/${nope}", &vars, MissingKeyMode::Sentinel);
        assert_eq!(result, format!("api.example.com/{}", VALUE_NOT_SET));
    }
}
