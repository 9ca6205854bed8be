/*
 * provider/traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Provider trait definition.
 */

//! The provider capability set.

use std::path::PathBuf;

use async_trait::async_trait;
use csl_config::{Map, Value};
use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::cancellation::Cancellation;

/// Options passed to [`Provider::init`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitOptions {
    /// Alias the provider is bound to for this run
    pub alias: String,
    /// Provider configuration (the extra keys of a `source:` block)
    #[serde(default)]
    pub config: Map,
    /// File that declared the provider, if any. Relative paths in `config`
    /// are resolved against its directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_path: Option<PathBuf>,
}

impl InitOptions {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: Map) -> Self {
        self.config = config;
        self
    }

    pub fn with_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file_path = Some(path.into());
        self
    }

    /// A string config entry.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}

/// Identification reported by [`Provider::info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A pluggable data source.
///
/// A provider is constructed on the first reference to its alias,
/// initialized once, then shared by every reference to that alias for the
/// rest of the run. `fetch` may be called concurrently; implementations
/// that cannot handle that must serialize internally.
///
/// # Example
///
/// ```ignore
/// use csl_core::provider::{InitOptions, Provider, ProviderError};
///
/// struct Constant(Value);
///
/// #[async_trait]
/// impl Provider for Constant {
///     async fn init(&mut self, _: &Cancellation, _: InitOptions) -> Result<(), ProviderError> {
///         Ok(())
///     }
///
///     async fn fetch(&self, _: &Cancellation, path: &[String]) -> Result<Value, ProviderError> {
///         self.0.get_path(path).cloned().ok_or_else(|| ProviderError::not_found(path))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Prepare the provider. Called exactly once per run, before any `fetch`.
    async fn init(&mut self, cancel: &Cancellation, options: InitOptions) -> Result<()>;

    /// Fetch the value at `path`. An empty path fetches the whole resource;
    /// each segment navigates one level. Missing data is
    /// [`ProviderError::NotFound`](super::ProviderError::NotFound).
    async fn fetch(&self, cancel: &Cancellation, path: &[String]) -> Result<Value>;

    /// Optional identification.
    fn info(&self) -> Option<ProviderInfo> {
        None
    }
}
