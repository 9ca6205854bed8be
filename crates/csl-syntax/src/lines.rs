//! Splitting source text into logical lines.
//!
//! Blank lines and comment-only lines are dropped. Each remaining line
//! records its indentation and the byte span of its text with trailing
//! comments and whitespace removed.

use std::path::Path;

use csl_source_map::FileInformation;

use crate::error::{ParseError, syntax_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line {
    /// 0-based row
    pub row: usize,
    /// Byte offset where the row starts
    pub line_start: usize,
    /// Byte offset of the first non-indent character
    pub text_start: usize,
    /// Byte offset just past the last significant character
    pub text_end: usize,
}

impl Line {
    /// Indentation width. Indentation is spaces only, so bytes and columns
    /// agree.
    pub fn indent(&self) -> usize {
        self.text_start - self.line_start
    }

    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        &content[self.text_start..self.text_end]
    }
}

pub(crate) fn split_lines(
    path: &Path,
    content: &str,
    info: &FileInformation,
) -> Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    for row in 0..info.line_count() {
        let Some(range) = info.line_range(content, row) else {
            continue;
        };
        let raw = &content[range.clone()];
        let indent = raw.len() - raw.trim_start_matches(' ').len();
        let rest = &raw[indent..];

        if rest.starts_with('\t') {
            return Err(syntax_error(
                path,
                content,
                info,
                range.start + indent,
                "CSL-1-3",
                "tabs are not allowed in indentation",
            ));
        }

        let significant = strip_comment(rest).trim_end();
        if significant.is_empty() {
            continue;
        }
        lines.push(Line {
            row,
            line_start: range.start,
            text_start: range.start + indent,
            text_end: range.start + indent + significant.len(),
        });
    }
    Ok(lines)
}

/// Cut a trailing `# comment`. A `#` only starts a comment at the start of
/// the text or after whitespace, and never inside a quoted string.
fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' && q == '"' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => {
                let at_boundary = previous.is_none_or(|p| p.is_whitespace() || p == ':' || p == '-');
                if (ch == '"' || ch == '\'') && at_boundary {
                    quote = Some(ch);
                } else if ch == '#' && previous.is_none_or(char::is_whitespace) {
                    return &text[..idx];
                }
            }
        }
        previous = Some(ch);
    }
    text
}
