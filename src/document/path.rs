//! Path expressions for structured documents
//!
//! Parses the dot/bracket vocabulary shared by the JSON and XML editors:
//! `user.name`, `items[0].id`, `hobbies[+]`. Paths may start with an
//! optional `$.` root marker, and `/`-separated spellings are accepted so
//! XML callers can write XPath-flavoured expressions.

use super::error::DocumentError;

/// One step in a parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object field or element name access (e.g. "user", "name")
    Field(String),

    /// Array index access (e.g. [0], [5])
    Index(usize),

    /// Append marker `[+]` or `[]`: extend the addressed array by one slot
    Append,
}

/// Parses a path expression into segments
///
/// `$`, `$.` and a leading `/` all denote the document root and parse to an
/// empty segment list. Bracket contents must be a non-negative integer, `+`,
/// or empty (the latter two meaning append).
///
/// # Errors
///
/// Returns [`DocumentError::MalformedPath`] for an empty expression, an
/// empty segment name (`a..b`), a trailing separator, an unterminated
/// bracket, or non-numeric bracket contents other than the append forms.
///
/// # Examples
///
/// ```
/// use rest_harness::document::path::{parse, Segment};
///
/// let segments = parse("$.items[0].id").unwrap();
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Field("items".to_string()),
///         Segment::Index(0),
///         Segment::Field("id".to_string()),
///     ]
/// );
/// ```
pub fn parse(path: &str) -> Result<Vec<Segment>, DocumentError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(DocumentError::malformed(path, "empty path expression"));
    }

    // Root references
    if trimmed == "$" || trimmed == "$." || trimmed == "/" {
        return Ok(Vec::new());
    }

    // Strip the optional root marker
    let rest = trimmed
        .strip_prefix("$.")
        .or_else(|| trimmed.strip_prefix('$'))
        .unwrap_or(trimmed);
    let rest = rest.strip_prefix('/').unwrap_or(rest);

    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = rest.chars().peekable();
    // True right after a bracket closes, so a following separator is legal
    // even though no field name is pending.
    let mut segment_just_closed = false;
    let mut trailing_separator = false;

    while let Some(ch) = chars.next() {
        match ch {
            '.' | '/' => {
                if !current.is_empty() {
                    segments.push(Segment::Field(std::mem::take(&mut current)));
                } else if !segment_just_closed {
                    return Err(DocumentError::malformed(path, "empty segment name"));
                }
                segment_just_closed = false;
                trailing_separator = true;
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment::Field(std::mem::take(&mut current)));
                }

                let mut index_str = String::new();
                let mut closed = false;
                for next_ch in chars.by_ref() {
                    if next_ch == ']' {
                        closed = true;
                        break;
                    }
                    index_str.push(next_ch);
                }
                if !closed {
                    return Err(DocumentError::malformed(path, "unterminated '[' bracket"));
                }

                let token = index_str.trim();
                if token.is_empty() || token == "+" {
                    segments.push(Segment::Append);
                } else {
                    match token.parse::<usize>() {
                        Ok(index) => segments.push(Segment::Index(index)),
                        Err(_) => {
                            return Err(DocumentError::malformed(
                                path,
                                format!("invalid index '{}'", token),
                            ));
                        }
                    }
                }

                segment_just_closed = true;
                trailing_separator = false;
            }
            _ => {
                current.push(ch);
                segment_just_closed = false;
                trailing_separator = false;
            }
        }
    }

    if trailing_separator {
        return Err(DocumentError::malformed(path, "trailing separator"));
    }

    if !current.is_empty() {
        segments.push(Segment::Field(current));
    }

    Ok(segments)
}

/// Renders segments back into canonical dotted form, used for error paths
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            Segment::Append => out.push_str("[+]"),
        }
    }
    out
}
