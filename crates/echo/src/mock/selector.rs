//! Compound CSS selectors for the in-memory DOM.
//!
//! Supported: an optional tag, then any sequence of `#id`, `.class`,
//! `[attr]`, `[attr=value]` (value bare, single- or double-quoted) and
//! `:checked`. Combinators are not supported.

use std::collections::BTreeMap;

use crate::result::{EchoError, EchoResult};

/// One simple selector inside a compound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Tag name, case-insensitive
    Tag(String),
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `[attr]`
    HasAttr(String),
    /// `[attr=value]`
    AttrEquals(String, String),
    /// `:checked`
    Checked,
}

/// What the matcher needs to know about a node
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    /// Lower-case tag
    pub tag: &'a str,
    /// Attributes
    pub attrs: &'a BTreeMap<String, String>,
    /// Checked or selected
    pub selected: bool,
}

/// Parsed compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    parts: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// Parse `input` or fail with a driver error naming the problem
    pub fn parse(input: &str) -> EchoResult<Self> {
        let source = input.trim();
        if source.is_empty() {
            return Err(invalid(input, "empty selector"));
        }
        if source.contains(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~' || c == ',') {
            return Err(invalid(input, "combinators are not supported"));
        }

        let mut parts = Vec::new();
        let mut rest = source;

        let tag_len = ident_len(rest);
        if tag_len > 0 {
            parts.push(SimpleSelector::Tag(rest[..tag_len].to_ascii_lowercase()));
            rest = &rest[tag_len..];
        } else if let Some(after) = rest.strip_prefix('*') {
            rest = after;
        }

        while let Some(marker) = rest.chars().next() {
            let after = &rest[marker.len_utf8()..];
            match marker {
                '#' | '.' => {
                    let len = ident_len(after);
                    if len == 0 {
                        return Err(invalid(input, "expected a name"));
                    }
                    let name = after[..len].to_string();
                    parts.push(if marker == '#' {
                        SimpleSelector::Id(name)
                    } else {
                        SimpleSelector::Class(name)
                    });
                    rest = &after[len..];
                }
                '[' => {
                    let close = after.find(']').ok_or_else(|| invalid(input, "unclosed attribute"))?;
                    parts.push(parse_attribute(input, &after[..close])?);
                    rest = &after[close + 1..];
                }
                ':' => {
                    let len = ident_len(after);
                    if &after[..len] != "checked" {
                        return Err(invalid(input, "only :checked is supported"));
                    }
                    parts.push(SimpleSelector::Checked);
                    rest = &after[len..];
                }
                _ => return Err(invalid(input, "unexpected character")),
            }
        }

        Ok(Self { parts })
    }

    /// Whether every part matches
    #[must_use]
    pub fn matches(&self, subject: &Subject<'_>) -> bool {
        self.parts.iter().all(|part| match part {
            SimpleSelector::Tag(tag) => subject.tag.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => subject.attrs.get("id") == Some(id),
            SimpleSelector::Class(class) => subject
                .attrs
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            SimpleSelector::HasAttr(name) => subject.attrs.contains_key(name),
            SimpleSelector::AttrEquals(name, value) => subject.attrs.get(name) == Some(value),
            SimpleSelector::Checked => subject.selected,
        })
    }

    /// Parsed parts
    #[must_use]
    pub fn parts(&self) -> &[SimpleSelector] {
        &self.parts
    }
}

fn parse_attribute(input: &str, body: &str) -> EchoResult<SimpleSelector> {
    let Some((name, value)) = body.split_once('=') else {
        let name = body.trim();
        if ident_len(name) != name.len() || name.is_empty() {
            return Err(invalid(input, "bad attribute name"));
        }
        return Ok(SimpleSelector::HasAttr(name.to_string()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid(input, "bad attribute name"));
    }
    let value = value.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value);
    Ok(SimpleSelector::AttrEquals(name.to_string(), unquoted.to_string()))
}

fn ident_len(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .map_or(s.len(), |(i, _)| i)
}

fn invalid(selector: &str, reason: &str) -> EchoError {
    EchoError::driver(format!("invalid selector '{selector}': {reason}"))
}
