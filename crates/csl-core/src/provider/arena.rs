/*
 * provider/arena.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-run provider instances.
 */

//! Per-run provider instances.
//!
//! A [`ProviderArena`] is created for every compile run and dropped at its
//! end, so no provider state leaks from one run into the next.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use super::error::{ProviderError, Result};
use super::manager::ProviderManager;
use super::registry::{ProviderDefinition, ProviderRegistry, ProviderTypeRegistry};
use super::traits::{InitOptions, Provider};
use crate::cancellation::Cancellation;

type Slot = Arc<OnceCell<Result<Arc<dyn Provider>>>>;

/// Initialized providers for one run, keyed by alias.
pub struct ProviderArena {
    registry: ProviderRegistry,
    types: ProviderTypeRegistry,
    manager: ProviderManager,
    instances: Mutex<HashMap<String, Slot>>,
}

impl ProviderArena {
    pub fn new(registry: ProviderRegistry, types: ProviderTypeRegistry) -> Self {
        Self::with_manager(registry, types, ProviderManager::new())
    }

    pub fn with_manager(
        registry: ProviderRegistry,
        types: ProviderTypeRegistry,
        manager: ProviderManager,
    ) -> Self {
        Self {
            registry,
            types,
            manager,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The initialized provider for `alias`.
    ///
    /// Built and initialized on first use. Concurrent callers share one
    /// initialization, and its outcome (including failure) is kept for the
    /// rest of the run.
    pub async fn get_provider(
        &self,
        cancel: &Cancellation,
        alias: &str,
    ) -> Result<Arc<dyn Provider>> {
        let Some(definition) = self.registry.get(alias) else {
            return Err(ProviderError::NotRegistered {
                alias: alias.to_string(),
            });
        };

        let slot = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(alias.to_string())
            .or_default()
            .clone();

        slot.get_or_init(|| self.build(cancel, alias, definition))
            .await
            .clone()
    }

    async fn build(
        &self,
        cancel: &Cancellation,
        alias: &str,
        definition: &ProviderDefinition,
    ) -> Result<Arc<dyn Provider>> {
        let mut init = InitOptions::new(alias).with_config(definition.config().clone());
        let provider = match definition {
            ProviderDefinition::Constructor { factory, .. } => {
                let mut provider = factory();
                provider.init(cancel, init).await?;
                provider
            }
            ProviderDefinition::Declared {
                provider_type,
                version,
                source_file,
                ..
            } => {
                if let Some(path) = source_file {
                    init = init.with_source_file(path);
                }
                let provider = self
                    .types
                    .create_provider(cancel, provider_type, init, &self.manager)
                    .await?;
                let actual = provider.info().and_then(|info| info.version);
                if let (Some(wanted), Some(actual)) = (version, &actual) {
                    if wanted != actual {
                        tracing::warn!(
                            alias,
                            provider_type = %provider_type,
                            wanted = %wanted,
                            actual = %actual,
                            "provider version differs from declaration"
                        );
                    }
                }
                provider
            }
        };
        tracing::debug!(alias, "provider initialized");
        Ok(Arc::from(provider))
    }

    /// Number of aliases whose provider has been requested.
    pub fn instance_count(&self) -> usize {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stop every remote provider started in this run.
    pub async fn shutdown(&self) -> Vec<String> {
        self.manager.shutdown().await
    }
}
