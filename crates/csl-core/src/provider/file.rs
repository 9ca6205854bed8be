/*
 * provider/file.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Provider serving the .csl files of a directory.
 */

//! The built-in `file` provider.
//!
//! Serves the `.csl` files of one directory, keyed by file stem:
//!
//! - `@base:.` fetches a map of every file in the directory
//! - `@base:app:.` fetches the whole of `app.csl`
//! - `@base:app:db.host` navigates into `app.csl`
//!
//! Configuration:
//!
//! - `directory`: directory to serve, relative to the file declaring the
//!   source (default `.`)
//!
//! `source:` blocks inside served files are ignored. Reference nodes are
//! returned as-is so the resolver can follow them.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use csl_config::{Map, Value};
use walkdir::WalkDir;

use super::error::{ProviderError, Result};
use super::traits::{InitOptions, Provider, ProviderInfo};
use crate::cancellation::Cancellation;

/// Provider type name of [`FileProvider`].
pub const FILE_PROVIDER_TYPE: &str = "file";

const EXTENSION: &str = "csl";

#[derive(Debug, Clone, Default)]
pub struct FileProvider {
    alias: String,
    directory: Option<PathBuf>,
}

impl FileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory being served, once initialized.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn served_directory(&self) -> Result<&Path> {
        self.directory
            .as_deref()
            .ok_or_else(|| ProviderError::other("file provider used before init"))
    }

    async fn load(&self, file: &Path) -> Result<Map> {
        let content = tokio::fs::read_to_string(file).await.map_err(|e| {
            ProviderError::other(format!("failed to read {}: {}", file.display(), e))
        })?;
        let parsed = csl_syntax::parse_document(file, &content, &HashMap::new()).map_err(|e| {
            let location = e
                .location()
                .map(|l| format!("{l}: "))
                .unwrap_or_default();
            ProviderError::other(format!("{location}{e}"))
        })?;
        Ok(parsed.document.data)
    }

    fn list_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ProviderError::other(e.to_string()))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == EXTENSION)
            {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl Provider for FileProvider {
    async fn init(&mut self, _cancel: &Cancellation, options: InitOptions) -> Result<()> {
        let configured = options.config_str("directory").unwrap_or(".");
        let base = match options.source_file_path.as_deref().and_then(Path::parent) {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()
                .map_err(|e| ProviderError::init(&options.alias, e.to_string()))?,
        };
        let directory: PathBuf = base
            .join(configured)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        if !directory.is_dir() {
            return Err(ProviderError::init(
                &options.alias,
                format!("{} is not a directory", directory.display()),
            ));
        }

        tracing::debug!(alias = %options.alias, directory = %directory.display(), "file provider ready");
        self.alias = options.alias;
        self.directory = Some(directory);
        Ok(())
    }

    async fn fetch(&self, cancel: &Cancellation, path: &[String]) -> Result<Value> {
        let directory = self.served_directory()?;

        let Some((stem, rest)) = path.split_first() else {
            let mut all = Map::new();
            for file in self.list_files(directory)? {
                if cancel.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                all.insert(stem.to_string(), Value::Map(self.load(&file).await?));
            }
            return Ok(Value::Map(all));
        };

        let file = directory.join(format!("{stem}.{EXTENSION}"));
        if !file.is_file() {
            return Err(ProviderError::NotFound(format!(
                "no file `{stem}.{EXTENSION}` in {}",
                directory.display()
            )));
        }
        let document = Value::Map(self.load(&file).await?);
        document
            .get_path(rest)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(path))
    }

    fn info(&self) -> Option<ProviderInfo> {
        Some(ProviderInfo {
            alias: self.alias.clone(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        })
    }
}
