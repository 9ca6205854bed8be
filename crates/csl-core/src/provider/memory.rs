/*
 * provider/memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory provider.
 */

//! A provider serving a fixed value tree.

use async_trait::async_trait;
use csl_config::Value;

use super::error::{ProviderError, Result};
use super::traits::{InitOptions, Provider, ProviderInfo};
use crate::cancellation::Cancellation;

/// Serves a fixed [`Value`]. Useful for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    root: Value,
    alias: Option<String>,
    version: Option<String>,
}

impl MemoryProvider {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            root: root.into(),
            alias: None,
            version: None,
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        Self::new(Value::from(json))
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn init(&mut self, _cancel: &Cancellation, options: InitOptions) -> Result<()> {
        self.alias = Some(options.alias);
        Ok(())
    }

    async fn fetch(&self, _cancel: &Cancellation, path: &[String]) -> Result<Value> {
        self.root
            .get_path(path)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(path))
    }

    fn info(&self) -> Option<ProviderInfo> {
        self.alias.as_ref().map(|alias| ProviderInfo {
            alias: alias.clone(),
            version: self.version.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_paths() {
        let mut provider = MemoryProvider::from_json(json!({"db": {"host": "localhost", "port": 5432}}));
        let cancel = Cancellation::new();
        provider.init(&cancel, InitOptions::new("mem")).await.unwrap();

        let root = provider.fetch(&cancel, &[]).await.unwrap();
        assert_eq!(root.to_json(), json!({"db": {"host": "localhost", "port": 5432}}));

        let host = provider.fetch(&cancel, &path(&["db", "host"])).await.unwrap();
        assert_eq!(host, Value::from("localhost"));

        let missing = provider.fetch(&cancel, &path(&["db", "user"])).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_info_after_init() {
        let mut provider = MemoryProvider::default().with_version("1.0.0");
        assert!(provider.info().is_none());

        provider
            .init(&Cancellation::new(), InitOptions::new("mem"))
            .await
            .unwrap();
        assert_eq!(
            provider.info(),
            Some(ProviderInfo {
                alias: "mem".into(),
                version: Some("1.0.0".into())
            })
        );
    }
}
