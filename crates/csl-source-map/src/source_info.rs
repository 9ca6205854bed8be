//! File-tagged source ranges

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Location, Range};

/// Where a value or reference token came from.
///
/// The file path is shared (`Arc<Path>`) because every token parsed out of
/// one file points at the same path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Absolute path of the file
    pub file: Arc<Path>,
    /// Range inside the file
    pub range: Range,
}

impl SourceInfo {
    pub fn new(file: impl Into<Arc<Path>>, range: Range) -> Self {
        SourceInfo {
            file: file.into(),
            range,
        }
    }

    /// A zero-width source info at `location`.
    pub fn point(file: impl AsRef<Path>, location: Location) -> Self {
        SourceInfo {
            file: Arc::from(file.as_ref()),
            range: Range::point(location),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.to_path_buf()
    }

    /// 1-based line of the range start.
    pub fn line(&self) -> usize {
        self.range.start.line_number()
    }

    /// 1-based column of the range start.
    pub fn column(&self) -> usize {
        self.range.start.column_number()
    }
}

/// Renders as `file:line:col`.
impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line(), self.column())
    }
}
