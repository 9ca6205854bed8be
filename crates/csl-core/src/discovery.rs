/*
 * discovery.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Finding the input files of a compile run.
 */

//! Finding the input files of a compile run.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CompileError, Result};

/// Extension of csl input files.
pub const CSL_EXTENSION: &str = "csl";

/// Input files for `path`, as absolute paths in merge order.
///
/// A file is used as-is. A directory contributes its top-level `.csl`
/// files, sorted lexicographically; subdirectories are not searched.
pub fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    let root = std::path::absolute(path).map_err(|e| CompileError::io(path, e))?;
    let metadata = std::fs::metadata(&root).map_err(|e| CompileError::io(&root, e))?;

    if metadata.is_file() {
        return Ok(vec![root]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            CompileError::io(path, e.into())
        })?;
        let is_csl = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == CSL_EXTENSION);
        if entry.file_type().is_file() && is_csl {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(CompileError::NoInputFiles { path: root });
    }
    files.sort();
    tracing::debug!(count = files.len(), root = %root.display(), "discovered input files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_is_sorted_and_shallow() {
        let dir = TempDir::new().unwrap();
        for name in ["override.csl", "base.csl", "notes.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/deep.csl"), "").unwrap();

        let files = discover_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["base.csl", "override.csl"]);
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("only.csl");
        std::fs::write(&file, "").unwrap();
        assert_eq!(discover_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_files(dir.path()),
            Err(CompileError::NoInputFiles { .. })
        ));
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_files(&dir.path().join("absent")),
            Err(CompileError::Io { .. })
        ));
    }
}
