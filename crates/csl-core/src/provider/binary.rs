/*
 * provider/binary.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Locating remote provider executables.
 */

//! Mapping provider types to executables.
//!
//! [`PathBinaryResolver`] looks for an executable named
//! `csl-provider-<type>` in this order:
//!
//! 1. directories added with [`PathBinaryResolver::with_dir`]
//! 2. `CSL_PROVIDER_DIR` environment variable
//! 3. system PATH via `which`

use std::path::{Path, PathBuf};

use csl_config::is_alias_char;

/// Environment variable naming a directory of provider executables.
pub const PROVIDER_DIR_ENV: &str = "CSL_PROVIDER_DIR";

/// Maps a provider type to a local executable.
pub trait BinaryResolver: Send + Sync {
    /// Executable for `provider_type`, or `None` when there is none.
    fn resolve(&self, provider_type: &str) -> Option<PathBuf>;
}

/// Default [`BinaryResolver`].
#[derive(Debug, Clone, Default)]
pub struct PathBinaryResolver {
    dirs: Vec<PathBuf>,
}

impl PathBinaryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `dir` before the environment and PATH.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }
}

/// Executable name for a provider type.
pub fn binary_name(provider_type: &str) -> String {
    #[cfg(windows)]
    {
        format!("csl-provider-{provider_type}.exe")
    }
    #[cfg(not(windows))]
    {
        format!("csl-provider-{provider_type}")
    }
}

fn find_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(name);
    candidate.is_file().then_some(candidate)
}

impl BinaryResolver for PathBinaryResolver {
    fn resolve(&self, provider_type: &str) -> Option<PathBuf> {
        // Types end up in a file name; keep them to token characters.
        if provider_type.is_empty() || !provider_type.chars().all(is_alias_char) {
            return None;
        }
        let name = binary_name(provider_type);

        if let Some(found) = self.dirs.iter().find_map(|dir| find_in(dir, &name)) {
            return Some(found);
        }

        if let Some(dir) = std::env::var_os(PROVIDER_DIR_ENV) {
            if let Some(found) = find_in(Path::new(&dir), &name) {
                return Some(found);
            }
        }

        which::which(&name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_dir_wins() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join(binary_name("vault"));
        std::fs::write(&binary, "").unwrap();

        let resolver = PathBinaryResolver::new().with_dir(dir.path());
        assert_eq!(resolver.resolve("vault"), Some(binary));
    }

    #[test]
    fn test_rejects_types_with_path_characters() {
        let resolver = PathBinaryResolver::new().with_dir("/");
        assert_eq!(resolver.resolve("../etc/passwd"), None);
        assert_eq!(resolver.resolve(""), None);
    }

    #[test]
    fn test_unknown_type() {
        let resolver = PathBinaryResolver::new();
        assert_eq!(resolver.resolve("definitely-not-installed-4242"), None);
    }
}
