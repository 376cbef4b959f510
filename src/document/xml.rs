//! XML document editing
//!
//! Mirrors the JSON editor's path semantics over XML text. Documents parse
//! into a small element tree, get mutated, and serialize back out. A field
//! segment selects child elements by name; an index or append marker picks
//! within (or extends) the run of same-named siblings.
//!
//! Parsing is deliberately small: elements, attributes, text, CDATA, the
//! five named entities, comments and prolog/doctype skipping. Mixed content
//! is normalized, with an element's text runs collected together.

use super::error::DocumentError;
use super::path::{parse, Segment};
use super::{DocumentEditor, FieldKind, FieldValue};
use std::iter::Peekable;
use std::str::Chars;

/// One element in the parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Element::new(name);
        element.text = text.into();
        element
    }
}

/// Path-addressed editor for XML documents
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEditor;

impl XmlEditor {
    pub fn new() -> Self {
        XmlEditor
    }
}

impl DocumentEditor for XmlEditor {
    fn read(&self, doc: &str, path: &str) -> Result<String, DocumentError> {
        let root = parse_document(doc)?;
        let steps = to_steps(&parse(path)?, path)?;
        let element = locate(&root, &steps, path)?;
        Ok(render_element(element))
    }

    fn read_typed(&self, doc: &str, path: &str, kind: FieldKind) -> Result<FieldValue, DocumentError> {
        let root = parse_document(doc)?;
        let steps = to_steps(&parse(path)?, path)?;
        let element = locate(&root, &steps, path)?;
        if !element.children.is_empty() {
            return Err(DocumentError::TypeMismatch {
                path: path.to_string(),
                expected: "text element".to_string(),
            });
        }
        FieldValue::from_text(&element.text, kind, path)
    }

    fn update(&self, doc: &str, path: &str, value: &FieldValue) -> Result<String, DocumentError> {
        let text = value.render_scalar().ok_or_else(|| DocumentError::TypeMismatch {
            path: path.to_string(),
            expected: "scalar value for an XML update".to_string(),
        })?;
        let mut root = parse_document(doc)?;
        let steps = to_steps(&parse(path)?, path)?;
        if steps.is_empty() {
            return Err(DocumentError::malformed(path, "cannot update the document root"));
        }
        update_element(&mut root, &steps, &text, path)?;
        Ok(serialize_document(&root))
    }

    fn delete(&self, doc: &str, path: &str) -> Result<String, DocumentError> {
        let mut root = parse_document(doc)?;
        let steps = to_steps(&parse(path)?, path)?;
        if steps.is_empty() {
            return Err(DocumentError::malformed(path, "cannot delete the document root"));
        }
        delete_element(&mut root, &steps, path)?;
        Ok(serialize_document(&root))
    }
}

/// How a step selects among same-named child elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selector {
    First,
    Nth(usize),
    Append,
}

/// A path segment pair resolved against the XML sibling model
#[derive(Debug, Clone)]
struct Step {
    name: String,
    selector: Selector,
}

/// Folds the shared segment vocabulary into XML steps
///
/// An index or append marker must follow an element name; XML has no
/// anonymous arrays to index into.
fn to_steps(segments: &[Segment], path: &str) -> Result<Vec<Step>, DocumentError> {
    let mut steps = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        match &segments[i] {
            Segment::Field(name) => {
                let selector = match segments.get(i + 1) {
                    Some(Segment::Index(n)) => {
                        i += 1;
                        Selector::Nth(*n)
                    }
                    Some(Segment::Append) => {
                        i += 1;
                        Selector::Append
                    }
                    _ => Selector::First,
                };
                steps.push(Step {
                    name: name.clone(),
                    selector,
                });
            }
            Segment::Index(_) | Segment::Append => {
                return Err(DocumentError::malformed(
                    path,
                    "an index must follow an element name",
                ));
            }
        }
        i += 1;
    }

    Ok(steps)
}

/// Walks read-only to the addressed element
fn locate<'a>(root: &'a Element, steps: &[Step], path: &str) -> Result<&'a Element, DocumentError> {
    let mut current = root;

    for step in steps {
        let run: Vec<&Element> = current
            .children
            .iter()
            .filter(|child| child.name == step.name)
            .collect();

        current = match step.selector {
            Selector::First => *run.first().ok_or_else(|| DocumentError::missing(path))?,
            Selector::Nth(n) => *run.get(n).ok_or_else(|| DocumentError::missing(path))?,
            Selector::Append => {
                return Err(DocumentError::malformed(
                    path,
                    "append marker not allowed in a read",
                ));
            }
        };
    }

    Ok(current)
}

/// Renders an element: bare text for leaves, serialized subtree otherwise
fn render_element(element: &Element) -> String {
    if element.children.is_empty() {
        element.text.clone()
    } else {
        let mut out = String::new();
        write_element(element, &mut out);
        out
    }
}

/// Index of the nth child named `name`, if present
fn nth_child_position(parent: &Element, name: &str, n: usize) -> Option<usize> {
    parent
        .children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.name == name)
        .map(|(position, _)| position)
        .nth(n)
}

fn run_len(parent: &Element, name: &str) -> usize {
    parent
        .children
        .iter()
        .filter(|child| child.name == name)
        .count()
}

/// Applies an update along `steps`
///
/// Intermediate steps must address existing elements. The leaf step may
/// create a missing element under an existing parent, and an append always
/// adds a new same-named sibling at the end.
fn update_element(
    current: &mut Element,
    steps: &[Step],
    text: &str,
    path: &str,
) -> Result<(), DocumentError> {
    let (step, rest) = match steps.split_first() {
        Some(pair) => pair,
        None => return Ok(()),
    };

    if rest.is_empty() {
        return match step.selector {
            Selector::Append => {
                current.children.push(Element::with_text(&*step.name, text));
                Ok(())
            }
            Selector::First => match nth_child_position(current, &step.name, 0) {
                Some(position) => {
                    let child = &mut current.children[position];
                    child.children.clear();
                    child.text = text.to_string();
                    Ok(())
                }
                None => {
                    current.children.push(Element::with_text(&*step.name, text));
                    Ok(())
                }
            },
            Selector::Nth(n) => {
                let len = run_len(current, &step.name);
                if len == 0 {
                    return Err(DocumentError::missing(path));
                }
                match nth_child_position(current, &step.name, n) {
                    Some(position) => {
                        let child = &mut current.children[position];
                        child.children.clear();
                        child.text = text.to_string();
                        Ok(())
                    }
                    None => Err(DocumentError::IndexOutOfBounds {
                        path: path.to_string(),
                        index: n,
                        len,
                    }),
                }
            }
        };
    }

    let position = match step.selector {
        Selector::First => nth_child_position(current, &step.name, 0),
        Selector::Nth(n) => nth_child_position(current, &step.name, n),
        Selector::Append => {
            return Err(DocumentError::malformed(
                path,
                "append marker only allowed at the end",
            ));
        }
    };

    match position {
        Some(position) => update_element(&mut current.children[position], rest, text, path),
        None => Err(DocumentError::missing(path)),
    }
}

/// Removes the addressed element; structural absence anywhere is a no-op
fn delete_element(current: &mut Element, steps: &[Step], path: &str) -> Result<(), DocumentError> {
    let (step, rest) = match steps.split_first() {
        Some(pair) => pair,
        None => return Ok(()),
    };

    if matches!(step.selector, Selector::Append) {
        return Err(DocumentError::malformed(
            path,
            "append marker not allowed in a delete",
        ));
    }

    let n = match step.selector {
        Selector::First => 0,
        Selector::Nth(n) => n,
        Selector::Append => unreachable!(),
    };

    match nth_child_position(current, &step.name, n) {
        Some(position) => {
            if rest.is_empty() {
                current.children.remove(position);
                Ok(())
            } else {
                delete_element(&mut current.children[position], rest, path)
            }
        }
        None => Ok(()),
    }
}

fn invalid(msg: impl Into<String>) -> DocumentError {
    DocumentError::InvalidDocument(msg.into())
}

/// Parses XML text into an element tree
fn parse_document(doc: &str) -> Result<Element, DocumentError> {
    let mut parser = XmlParser {
        chars: doc.chars().peekable(),
    };
    parser.skip_misc()?;
    if parser.chars.peek().is_none() {
        return Err(invalid("empty XML document"));
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if parser.chars.next().is_some() {
        return Err(invalid("trailing content after the root element"));
    }
    Ok(root)
}

struct XmlParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl XmlParser<'_> {
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }

    /// Peeks at the character after the current one
    fn peek_second(&mut self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    /// True when the upcoming characters spell `expected`
    fn lookahead_is(&mut self, expected: &str) -> bool {
        let mut ahead = self.chars.clone();
        expected.chars().all(|c| ahead.next() == Some(c))
    }

    fn consume_str(&mut self, literal: &str) {
        for _ in literal.chars() {
            self.chars.next();
        }
    }

    /// Skips whitespace, prolog, doctype, and comments between elements
    fn skip_misc(&mut self) -> Result<(), DocumentError> {
        loop {
            self.skip_whitespace();
            if self.chars.peek() != Some(&'<') {
                return Ok(());
            }
            match self.peek_second() {
                Some('?') => {
                    // Processing instruction: consume until ?>
                    self.consume_str("<?");
                    let mut prev = ' ';
                    loop {
                        match self.chars.next() {
                            Some('>') if prev == '?' => break,
                            Some(c) => prev = c,
                            None => return Err(invalid("unterminated processing instruction")),
                        }
                    }
                }
                Some('!') => {
                    if self.lookahead_is("<!--") {
                        self.consume_comment()?;
                    } else {
                        // DOCTYPE or similar declaration: consume until >
                        self.consume_str("<!");
                        loop {
                            match self.chars.next() {
                                Some('>') => break,
                                Some(_) => {}
                                None => return Err(invalid("unterminated declaration")),
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn consume_comment(&mut self) -> Result<(), DocumentError> {
        self.consume_str("<!--");
        let mut prev = ' ';
        let mut prev_prev = ' ';
        loop {
            match self.chars.next() {
                Some('>') if prev == '-' && prev_prev == '-' => return Ok(()),
                Some(c) => {
                    prev_prev = prev;
                    prev = c;
                }
                None => return Err(invalid("unterminated comment")),
            }
        }
    }

    fn consume_cdata(&mut self) -> Result<String, DocumentError> {
        self.consume_str("<![CDATA[");
        let mut data = String::new();
        loop {
            match self.chars.next() {
                Some('>') if data.ends_with("]]") => {
                    data.truncate(data.len() - 2);
                    return Ok(data);
                }
                Some(c) => data.push(c),
                None => return Err(invalid("unterminated CDATA section")),
            }
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.') {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        name
    }

    fn read_text(&mut self) -> String {
        let mut raw = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '<' {
                break;
            }
            raw.push(c);
            self.chars.next();
        }
        decode_entities(&raw)
    }

    fn parse_attribute(&mut self) -> Result<(String, String), DocumentError> {
        let name = self.read_name();
        if name.is_empty() {
            return Err(invalid("expected attribute name"));
        }
        self.skip_whitespace();
        if self.chars.next() != Some('=') {
            return Err(invalid(format!("attribute '{}' is missing '='", name)));
        }
        self.skip_whitespace();
        let quote = match self.chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(invalid(format!("attribute '{}' value must be quoted", name))),
        };
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(invalid("unterminated attribute value")),
            }
        }
        Ok((name, decode_entities(&value)))
    }

    fn parse_element(&mut self) -> Result<Element, DocumentError> {
        if self.chars.next() != Some('<') {
            return Err(invalid("expected '<'"));
        }
        let name = self.read_name();
        if name.is_empty() {
            return Err(invalid("empty element name"));
        }
        let mut element = Element::new(name);

        // Attributes until '>' or '/>'
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some('/') => {
                    self.chars.next();
                    if self.chars.next() == Some('>') {
                        return Ok(element);
                    }
                    return Err(invalid("malformed self-closing tag"));
                }
                Some('>') => {
                    self.chars.next();
                    break;
                }
                Some(_) => {
                    let (key, value) = self.parse_attribute()?;
                    element.attributes.push((key, value));
                }
                None => return Err(invalid("unexpected end of input inside a tag")),
            }
        }

        // Content until the matching closing tag
        loop {
            match self.chars.peek() {
                Some('<') => match self.peek_second() {
                    Some('/') => {
                        self.consume_str("</");
                        let closing = self.read_name();
                        self.skip_whitespace();
                        if self.chars.next() != Some('>') {
                            return Err(invalid("malformed closing tag"));
                        }
                        if closing != element.name {
                            return Err(invalid(format!(
                                "mismatched closing tag '{}', expected '{}'",
                                closing, element.name
                            )));
                        }
                        element.text = element.text.trim().to_string();
                        return Ok(element);
                    }
                    Some('!') => {
                        if self.lookahead_is("<!--") {
                            self.consume_comment()?;
                        } else if self.lookahead_is("<![CDATA[") {
                            let data = self.consume_cdata()?;
                            element.text.push_str(&data);
                        } else {
                            return Err(invalid("unsupported markup inside element"));
                        }
                    }
                    _ => {
                        let child = self.parse_element()?;
                        element.children.push(child);
                    }
                },
                Some(_) => {
                    let text = self.read_text();
                    element.text.push_str(&text);
                }
                None => {
                    return Err(invalid(format!("unclosed element '{}'", element.name)));
                }
            }
        }
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            out.push(ch);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&next) = chars.peek() {
            chars.next();
            if next == ';' {
                terminated = true;
                break;
            }
            entity.push(next);
            if entity.len() > 8 {
                break;
            }
        }
        if terminated {
            match entity.as_str() {
                "amp" => out.push('&'),
                "lt" => out.push('<'),
                "gt" => out.push('>'),
                "quot" => out.push('"'),
                "apos" => out.push('\''),
                _ => {
                    // Unknown entity is kept literally
                    out.push('&');
                    out.push_str(&entity);
                    out.push(';');
                }
            }
        } else {
            out.push('&');
            out.push_str(&entity);
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

fn serialize_document(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, &mut out);
    out
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if element.text.is_empty() && element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    out.push_str(&escape_text(&element.text));
    for child in &element.children {
        write_element(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}
