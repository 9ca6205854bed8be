//! Line index over a file's contents

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Line-break index for one file.
///
/// Stores the byte offset of every `\n` so that offsets can be turned into
/// rows and columns with a binary search, and so that a single source line
/// can be sliced out for snippet rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    line_breaks: Vec<usize>,
    total_length: usize,
}

impl FileInformation {
    /// Index `content`.
    ///
    /// ```
    /// use csl_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("a: 1\nb: 2");
    /// assert_eq!(info.line_count(), 2);
    /// ```
    pub fn new(content: &str) -> Self {
        let line_breaks = content
            .char_indices()
            .filter_map(|(idx, ch)| (ch == '\n').then_some(idx))
            .collect();

        FileInformation {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a [`Location`].
    ///
    /// Returns `None` when the offset lies past the end of the file. The
    /// column counts characters, so `content` must be the text that was
    /// indexed.
    pub fn offset_to_location(&self, content: &str, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // A newline belongs to the line it terminates.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };
        let line_start = self.line_start(row)?;
        let column = content.get(line_start..offset)?.chars().count();

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Byte offset at which `row` starts.
    pub fn line_start(&self, row: usize) -> Option<usize> {
        match row {
            0 => Some(0),
            _ => self.line_breaks.get(row - 1).map(|nl| nl + 1),
        }
    }

    /// Byte range of `row`, excluding its terminating newline (and a
    /// preceding `\r`, if any).
    pub fn line_range(&self, content: &str, row: usize) -> Option<std::ops::Range<usize>> {
        let start = self.line_start(row)?;
        let mut end = self
            .line_breaks
            .get(row)
            .copied()
            .unwrap_or(self.total_length);
        if end > start && content.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(start..end)
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of lines; a file with `n` newlines has `n + 1` lines.
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}
