//! Source context for managing file contents

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::file_info::FileInformation;
use crate::source_info::SourceInfo;
use crate::types::Location;

/// A source file with its content and line index
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: Arc<str>,
    pub file_info: FileInformation,
}

/// File contents keyed by path.
///
/// Files are either registered up front (the compiler adds every input file
/// it reads) or loaded from disk the first time a diagnostic needs them, for
/// example files read by a provider rather than by the compiler.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    files: HashMap<PathBuf, SourceFile>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register in-memory content for `path`, replacing any previous entry.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<Arc<str>>) {
        let path = path.into();
        let content: Arc<str> = content.into();
        let file_info = FileInformation::new(&content);
        self.files.insert(
            path.clone(),
            SourceFile {
                path,
                content,
                file_info,
            },
        );
    }

    /// Get a registered file.
    pub fn get_file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    /// Get a file, reading it from disk if it was never registered.
    ///
    /// Returns `None` if the file is unknown and cannot be read.
    pub fn load(&mut self, path: &Path) -> Option<&SourceFile> {
        if !self.files.contains_key(path) {
            let content = std::fs::read_to_string(path).ok()?;
            self.add_file(path, content);
        }
        self.files.get(path)
    }

    /// Text of the 0-indexed `row` of a registered file, without its newline.
    pub fn line_text(&self, path: &Path, row: usize) -> Option<&str> {
        let file = self.files.get(path)?;
        let range = file.file_info.line_range(&file.content, row)?;
        file.content.get(range)
    }

    /// Resolve a byte offset in a registered file to a [`Location`].
    pub fn offset_to_location(&self, path: &Path, offset: usize) -> Option<Location> {
        let file = self.files.get(path)?;
        file.file_info.offset_to_location(&file.content, offset)
    }

    /// Make sure the file behind `info` is available, loading it from disk
    /// if needed, and return the text of its start line.
    pub fn source_line(&mut self, info: &SourceInfo) -> Option<String> {
        self.load(&info.file)?;
        self.line_text(&info.file, info.range.start.row)
            .map(str::to_string)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
