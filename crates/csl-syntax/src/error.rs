//! Parse errors.

use std::path::Path;

use csl_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use csl_source_map::{FileInformation, Range, SourceInfo};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// A `.csl` file could not be parsed.
///
/// Wraps a located [`DiagnosticMessage`] so callers can render it with a
/// source snippet.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{diagnostic}")]
pub struct ParseError {
    pub diagnostic: DiagnosticMessage,
}

impl ParseError {
    pub fn location(&self) -> Option<&SourceInfo> {
        self.diagnostic.location.as_ref()
    }
}

impl From<DiagnosticMessage> for ParseError {
    fn from(diagnostic: DiagnosticMessage) -> Self {
        ParseError { diagnostic }
    }
}

/// Location of a byte offset in `content`, falling back to the file start.
pub(crate) fn locate(path: &Path, content: &str, info: &FileInformation, offset: usize) -> SourceInfo {
    let location = info
        .offset_to_location(content, offset)
        .unwrap_or_default();
    SourceInfo::new(path, Range::point(location))
}

/// A located span of `len` characters starting at a byte offset.
pub(crate) fn locate_span(
    path: &Path,
    content: &str,
    info: &FileInformation,
    offset: usize,
    len: usize,
) -> SourceInfo {
    let start = info
        .offset_to_location(content, offset)
        .unwrap_or_default();
    SourceInfo::new(path, Range::on_row(start, len))
}

pub(crate) fn syntax_error(
    path: &Path,
    content: &str,
    info: &FileInformation,
    offset: usize,
    code: &str,
    problem: impl Into<String>,
) -> ParseError {
    let title = match code {
        "CSL-1-2" => "Invalid source declaration",
        "CSL-1-3" => "Inconsistent indentation",
        _ => "Syntax error",
    };
    DiagnosticMessageBuilder::error(title)
        .with_code(code)
        .problem(problem.into())
        .with_location(locate(path, content, info, offset))
        .build()
        .into()
}
