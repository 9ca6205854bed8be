//! Reference tokens.
//!
//! A reference asks a provider for a value:
//!
//! - `@alias:.` fetches the whole resource (root reference)
//! - `@alias:seg.seg` navigates into the resource
//! - `@alias:resource:seg.seg` is the same as `@alias:resource.seg.seg`
//! - `@alias:resource:.` is the same as `@alias:resource`
//!
//! Alias and segment characters are ASCII letters, digits, `-` and `_`.

use std::fmt;

use csl_source_map::SourceInfo;
use thiserror::Error;

/// A parsed reference token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Provider alias
    pub alias: String,
    /// Path segments; empty for a root reference
    pub path: Vec<String>,
    /// Where the token was written, if it came from a file
    pub source: Option<SourceInfo>,
}

/// Errors for malformed reference tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceSyntaxError {
    #[error("reference `{token}` must start with `@`")]
    MissingAt { token: String },

    #[error("reference `{token}` has an empty or invalid alias")]
    InvalidAlias { token: String },

    #[error("reference `{token}` is missing `:` after the alias")]
    MissingColon { token: String },

    #[error("reference `{token}` has an empty path; use `@alias:.` for the whole resource")]
    EmptyPath { token: String },

    #[error("reference `{token}` has an invalid path segment `{segment}`")]
    InvalidSegment { token: String, segment: String },
}

pub fn is_alias_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Reference {
    pub fn new(alias: impl Into<String>, path: Vec<String>) -> Self {
        Reference {
            alias: alias.into(),
            path,
            source: None,
        }
    }

    /// A root reference (`@alias:.`).
    pub fn root(alias: impl Into<String>) -> Self {
        Self::new(alias, Vec::new())
    }

    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Cache key: `alias:seg.seg`, or `alias:.` for a root reference.
    ///
    /// ```
    /// use csl_config::Reference;
    ///
    /// let r = Reference::new("base", vec!["app".into()]);
    /// assert_eq!(r.identifier(), "base:app");
    /// assert_eq!(Reference::root("base").identifier(), "base:.");
    /// ```
    pub fn identifier(&self) -> String {
        if self.path.is_empty() {
            format!("{}:.", self.alias)
        } else {
            format!("{}:{}", self.alias, self.path.join("."))
        }
    }

    /// Check that alias and segments only use token characters.
    ///
    /// References built by the parser always pass; references assembled by
    /// hand (or decoded from a provider) may not.
    pub fn validate(&self) -> Result<(), ReferenceSyntaxError> {
        let token = self.to_string();
        if self.alias.is_empty() || !self.alias.chars().all(is_alias_char) {
            return Err(ReferenceSyntaxError::InvalidAlias { token });
        }
        if let Some(segment) = self
            .path
            .iter()
            .find(|s| s.is_empty() || !s.chars().all(is_alias_char))
        {
            return Err(ReferenceSyntaxError::InvalidSegment {
                segment: segment.clone(),
                token,
            });
        }
        Ok(())
    }
}

/// Renders the canonical token (`@alias:a.b`, `@alias:.`).
impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "@{}:.", self.alias)
        } else {
            write!(f, "@{}:{}", self.alias, self.path.join("."))
        }
    }
}

/// Parse a complete reference token. The whole input must be one token.
///
/// ```
/// use csl_config::parse_reference;
///
/// let r = parse_reference("@base:base:database.host").unwrap();
/// assert_eq!(r.alias, "base");
/// assert_eq!(r.path, vec!["base", "database", "host"]);
/// ```
pub fn parse_reference(token: &str) -> Result<Reference, ReferenceSyntaxError> {
    let owned = || token.to_string();
    let Some(rest) = token.strip_prefix('@') else {
        return Err(ReferenceSyntaxError::MissingAt { token: owned() });
    };
    let alias_len = rest.find(|c: char| !is_alias_char(c)).unwrap_or(rest.len());
    if alias_len == 0 {
        return Err(ReferenceSyntaxError::InvalidAlias { token: owned() });
    }
    let (alias, rest) = rest.split_at(alias_len);
    let Some(body) = rest.strip_prefix(':') else {
        return Err(ReferenceSyntaxError::MissingColon { token: owned() });
    };
    if body.is_empty() {
        return Err(ReferenceSyntaxError::EmptyPath { token: owned() });
    }
    match scan_body(body) {
        Some((path, consumed)) if consumed == body.len() => Ok(Reference::new(alias, path)),
        _ => {
            let segment = body
                .split(['.', ':'])
                .find(|s| s.is_empty() || !s.chars().all(is_alias_char))
                .unwrap_or(body)
                .to_string();
            Err(ReferenceSyntaxError::InvalidSegment {
                token: owned(),
                segment,
            })
        }
    }
}

/// Scan the path part of a token (after `@alias:`).
///
/// Returns the segments and the number of bytes consumed, or `None` when
/// no valid path starts here. Scanning stops at the first character that
/// cannot continue the token, so `a.b.` consumes `a.b` and leaves the
/// trailing dot as literal text.
fn scan_body(body: &str) -> Option<(Vec<String>, usize)> {
    let bytes = body.as_bytes();
    let is_seg = |i: usize| bytes.get(i).is_some_and(|b| is_alias_char(*b as char));

    if bytes.first() == Some(&b'.') && !is_seg(1) {
        return Some((Vec::new(), 1));
    }

    let mut path = Vec::new();
    let mut pos = 0;
    let mut resource_separator_used = false;
    loop {
        let start = pos;
        while is_seg(pos) {
            pos += 1;
        }
        if pos == start {
            return None;
        }
        path.push(body[start..pos].to_string());

        match bytes.get(pos) {
            Some(b'.') if is_seg(pos + 1) => pos += 1,
            Some(b':') if !resource_separator_used && path.len() == 1 => {
                if is_seg(pos + 1) && !is_port(&body[pos + 1..]) {
                    resource_separator_used = true;
                    pos += 1;
                } else if bytes.get(pos + 1) == Some(&b'.') && !is_seg(pos + 2) {
                    return Some((path, pos + 2));
                } else {
                    return Some((path, pos));
                }
            }
            _ => return Some((path, pos)),
        }
    }
}

/// Whether `rest` starts with an all-digit segment, as in `@svc:host:8080`.
/// Such a colon is literal text, not the resource separator.
fn is_port(rest: &str) -> bool {
    let end = rest
        .find(|c: char| !is_alias_char(c))
        .unwrap_or(rest.len());
    end > 0 && rest[..end].bytes().all(|b| b.is_ascii_digit())
}

/// A piece of scanned text.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment<'a> {
    Literal(&'a str),
    Token {
        /// Byte offset of the `@`
        offset: usize,
        /// Byte length of the token
        len: usize,
        reference: Reference,
    },
}

fn token_at(text: &str, at: usize) -> Option<(Reference, usize)> {
    let rest = &text[at + 1..];
    let alias_len = rest.find(|c: char| !is_alias_char(c)).unwrap_or(rest.len());
    if alias_len == 0 || rest.as_bytes().get(alias_len) != Some(&b':') {
        return None;
    }
    let body = &rest[alias_len + 1..];
    let (path, consumed) = scan_body(body)?;
    Some((
        Reference::new(&rest[..alias_len], path),
        1 + alias_len + 1 + consumed,
    ))
}

/// Split `text` into literal runs and reference tokens.
///
/// An `@` only starts a token at the beginning of the text or after a
/// character that is not alphanumeric, so `ops@example.com:22` stays
/// literal. Malformed tokens are kept as literal text.
///
/// ```
/// use csl_config::{Fragment, scan_references};
///
/// let parts = scan_references("postgres://@base:db.host:5432");
/// assert_eq!(parts.len(), 3);
/// assert!(matches!(parts[0], Fragment::Literal("postgres://")));
/// assert!(matches!(parts[2], Fragment::Literal(":5432")));
/// ```
pub fn scan_references(text: &str) -> Vec<Fragment<'_>> {
    let mut fragments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('@') {
        let at = cursor + found;
        let boundary = text[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        match token_at(text, at).filter(|_| boundary) {
            Some((reference, len)) => {
                if literal_start < at {
                    fragments.push(Fragment::Literal(&text[literal_start..at]));
                }
                fragments.push(Fragment::Token {
                    offset: at,
                    len,
                    reference,
                });
                cursor = at + len;
                literal_start = cursor;
            }
            None => cursor = at + 1,
        }
    }

    if literal_start < text.len() {
        fragments.push(Fragment::Literal(&text[literal_start..]));
    }
    fragments
}

/// Whether `text` contains at least one reference token.
pub fn contains_reference(text: &str) -> bool {
    scan_references(text)
        .iter()
        .any(|f| matches!(f, Fragment::Token { .. }))
}

/// A part of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Reference(Reference),
}

/// A string mixing literal text and references, resolved by interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

impl Template {
    /// Build a template from scanned fragments. `locate` maps a token's
    /// byte offset to its source location, when the text came from a file.
    pub fn from_fragments(
        fragments: Vec<Fragment<'_>>,
        mut locate: impl FnMut(usize, usize) -> Option<SourceInfo>,
    ) -> Self {
        let parts = fragments
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Literal(text) => TemplatePart::Literal(text.to_string()),
                Fragment::Token {
                    offset,
                    len,
                    mut reference,
                } => {
                    reference.source = locate(offset, len);
                    TemplatePart::Reference(reference)
                }
            })
            .collect();
        Template { parts }
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Reference(r) => Some(r),
            TemplatePart::Literal(_) => None,
        })
    }
}

/// Renders the original text, tokens in canonical form.
impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => f.write_str(text)?,
                TemplatePart::Reference(reference) => write!(f, "{}", reference)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_root() {
        let r = parse_reference("@base:.").unwrap();
        assert_eq!(r.alias, "base");
        assert!(r.is_root());
        assert_eq!(r.identifier(), "base:.");
    }

    #[test]
    fn test_parse_dotted_path() {
        let r = parse_reference("@config-1:database.primary_host").unwrap();
        assert_eq!(r.alias, "config-1");
        assert_eq!(r.path, path(&["database", "primary_host"]));
        assert_eq!(r.identifier(), "config-1:database.primary_host");
    }

    #[test]
    fn test_parse_resource_form() {
        let r = parse_reference("@base:base:database.host").unwrap();
        assert_eq!(r.path, path(&["base", "database", "host"]));

        let whole = parse_reference("@base:app:.").unwrap();
        assert_eq!(whole.path, path(&["app"]));
        assert_eq!(whole.identifier(), "base:app");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_reference("base:x"),
            Err(ReferenceSyntaxError::MissingAt { .. })
        ));
        assert!(matches!(
            parse_reference("@:x"),
            Err(ReferenceSyntaxError::InvalidAlias { .. })
        ));
        assert!(matches!(
            parse_reference("@base"),
            Err(ReferenceSyntaxError::MissingColon { .. })
        ));
        assert!(matches!(
            parse_reference("@base:"),
            Err(ReferenceSyntaxError::EmptyPath { .. })
        ));
        assert!(matches!(
            parse_reference("@base:a..b"),
            Err(ReferenceSyntaxError::InvalidSegment { .. })
        ));
        assert!(matches!(
            parse_reference("@base:a b"),
            Err(ReferenceSyntaxError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_display_roundtrips_canonical_form() {
        for token in ["@base:.", "@base:a.b.c", "@x_1:y"] {
            assert_eq!(parse_reference(token).unwrap().to_string(), token);
        }
        assert_eq!(
            parse_reference("@base:app:db.host").unwrap().to_string(),
            "@base:app.db.host"
        );
    }

    #[test]
    fn test_validate_hand_built_reference() {
        assert!(Reference::new("base", path(&["a"])).validate().is_ok());
        assert!(Reference::new("", path(&["a"])).validate().is_err());
        assert!(Reference::new("base", path(&["a b"])).validate().is_err());
        assert!(Reference::new("base", path(&[""])).validate().is_err());
    }

    #[test]
    fn test_scan_mixed_text() {
        let fragments = scan_references("http://@svc:web.host:@svc:web.port/health");
        let tokens: Vec<_> = fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Token {
                    offset, reference, ..
                } => Some((*offset, reference.identifier())),
                Fragment::Literal(_) => None,
            })
            .collect();
        assert_eq!(
            tokens,
            vec![
                (7, "svc:web.host".to_string()),
                (21, "svc:web.port".to_string())
            ]
        );
        assert_eq!(fragments.last(), Some(&Fragment::Literal("/health")));
    }

    #[test]
    fn test_scan_port_after_token_is_literal() {
        let fragments = scan_references("http://@svc:host:8080/health");
        assert!(matches!(
            &fragments[1],
            Fragment::Token { reference, .. } if reference.identifier() == "svc:host"
        ));
        assert_eq!(fragments[2], Fragment::Literal(":8080/health"));

        let fragments = scan_references("@a:b:8080");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1], Fragment::Literal(":8080"));

        // A resource path that merely starts with a digit still counts.
        let reference = parse_reference("@a:b:8080x.y").unwrap();
        assert_eq!(reference.identifier(), "a:b.8080x.y");
    }

    #[test]
    fn test_scan_ignores_email_addresses() {
        assert!(!contains_reference("ops@example.com:22"));
        assert!(!contains_reference("no tokens here"));
        assert!(contains_reference("(@a:b)"));
    }

    #[test]
    fn test_scan_keeps_malformed_token_literal() {
        let fragments = scan_references("see @base: for details");
        assert_eq!(fragments, vec![Fragment::Literal("see @base: for details")]);
    }

    #[test]
    fn test_scan_trailing_dot_is_literal() {
        let fragments = scan_references("value is @a:b.c.");
        assert!(matches!(
            &fragments[1],
            Fragment::Token { len: 6, reference, .. } if reference.path == path(&["b", "c"])
        ));
        assert_eq!(fragments[2], Fragment::Literal("."));
    }

    #[test]
    fn test_template_display() {
        let template = Template::from_fragments(scan_references("db=@base:db.host!"), |_, _| None);
        assert_eq!(template.references().count(), 1);
        assert_eq!(template.to_string(), "db=@base:db.host!");
    }
}
