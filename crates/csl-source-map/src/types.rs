//! Core position types

use serde::{Deserialize, Serialize};

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

impl Location {
    /// 1-based line number, as printed in diagnostics.
    pub fn line_number(&self) -> usize {
        self.row + 1
    }

    /// 1-based column number, as printed in diagnostics.
    pub fn column_number(&self) -> usize {
        self.column + 1
    }
}

/// A range in source text from start to end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Range {
    /// A zero-width range at `location`.
    pub fn point(location: Location) -> Self {
        Range {
            start: location,
            end: location,
        }
    }

    /// A range on a single row spanning `len` characters.
    pub fn on_row(start: Location, len: usize) -> Self {
        Range {
            start,
            end: Location {
                offset: start.offset + len,
                row: start.row,
                column: start.column + len,
            },
        }
    }
}
