/*
 * provider/registry.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Alias and provider-type registries.
 */

//! Alias and provider-type registries.
//!
//! Two lookups turn a reference's alias into a running provider:
//!
//! - [`ProviderRegistry`]: alias to definition. A definition is either a
//!   constructor registered by the embedding program or a `source:`
//!   declaration found in a `.csl` file.
//! - [`ProviderTypeRegistry`]: provider type to an in-process
//!   constructor, falling back to an executable found by a
//!   [`BinaryResolver`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use csl_config::Map;
use csl_syntax::SourceDecl;

use super::binary::{BinaryResolver, PathBinaryResolver};
use super::error::{ProviderError, Result};
use super::file::{FILE_PROVIDER_TYPE, FileProvider};
use super::manager::ProviderManager;
use super::traits::{InitOptions, Provider};
use crate::cancellation::Cancellation;

/// Builds a fresh, uninitialized provider.
pub type ProviderFactory = Arc<dyn Fn() -> Box<dyn Provider> + Send + Sync>;

/// How to build the provider behind one alias.
#[derive(Clone)]
pub enum ProviderDefinition {
    /// Registered in code by the embedding program.
    Constructor { factory: ProviderFactory, config: Map },
    /// Declared by a `source:` block.
    Declared {
        provider_type: String,
        version: Option<String>,
        config: Map,
        source_file: Option<PathBuf>,
    },
}

impl ProviderDefinition {
    pub fn config(&self) -> &Map {
        match self {
            Self::Constructor { config, .. } | Self::Declared { config, .. } => config,
        }
    }

    pub fn is_declared(&self) -> bool {
        matches!(self, Self::Declared { .. })
    }
}

impl fmt::Debug for ProviderDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor { config, .. } => f
                .debug_struct("Constructor")
                .field("config", config)
                .finish_non_exhaustive(),
            Self::Declared {
                provider_type,
                version,
                config,
                source_file,
            } => f
                .debug_struct("Declared")
                .field("provider_type", provider_type)
                .field("version", version)
                .field("config", config)
                .field("source_file", source_file)
                .finish(),
        }
    }
}

impl From<&SourceDecl> for ProviderDefinition {
    fn from(decl: &SourceDecl) -> Self {
        Self::Declared {
            provider_type: decl.provider_type.clone(),
            version: decl.version.clone(),
            config: decl.config.clone(),
            source_file: Some(decl.source.path()),
        }
    }
}

/// Alias to provider definition.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    definitions: HashMap<String, ProviderDefinition>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to providers built by `factory`, with empty config.
    pub fn register<F, P>(&mut self, alias: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Provider + 'static,
    {
        self.register_with_config(alias, factory, Map::new())
    }

    /// Bind `alias` to providers built by `factory`, initialized with `config`.
    pub fn register_with_config<F, P>(
        &mut self,
        alias: impl Into<String>,
        factory: F,
        config: Map,
    ) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Provider + 'static,
    {
        let factory: ProviderFactory = Arc::new(move || Box::new(factory()) as Box<dyn Provider>);
        self.definitions
            .insert(alias.into(), ProviderDefinition::Constructor { factory, config });
        self
    }

    /// Add a `source:` declaration. Returns the definition it replaced.
    pub fn declare(&mut self, decl: &SourceDecl) -> Option<ProviderDefinition> {
        self.definitions
            .insert(decl.alias.clone(), ProviderDefinition::from(decl))
    }

    pub fn get(&self, alias: &str) -> Option<&ProviderDefinition> {
        self.definitions.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.definitions.contains_key(alias)
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<_> = self.definitions.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Provider type to implementation.
#[derive(Clone, Default)]
pub struct ProviderTypeRegistry {
    constructors: HashMap<String, ProviderFactory>,
    binary_resolver: Option<Arc<dyn BinaryResolver>>,
}

impl ProviderTypeRegistry {
    /// An empty registry: no in-process types, no executables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The `file` type in-process, and executables found on PATH.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(FILE_PROVIDER_TYPE, FileProvider::new);
        registry.with_binary_resolver(PathBinaryResolver::new())
    }

    /// Register an in-process implementation of `provider_type`.
    pub fn register<F, P>(&mut self, provider_type: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Provider + 'static,
    {
        let factory: ProviderFactory = Arc::new(move || Box::new(factory()) as Box<dyn Provider>);
        self.constructors.insert(provider_type.into(), factory);
        self
    }

    pub fn with_binary_resolver(mut self, resolver: impl BinaryResolver + 'static) -> Self {
        self.binary_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn has_type(&self, provider_type: &str) -> bool {
        self.constructors.contains_key(provider_type)
    }

    /// Build and initialize a provider of `provider_type`.
    ///
    /// An in-process constructor wins. Otherwise the binary resolver maps
    /// the type to an executable, which `manager` starts.
    pub async fn create_provider(
        &self,
        cancel: &Cancellation,
        provider_type: &str,
        init: InitOptions,
        manager: &ProviderManager,
    ) -> Result<Box<dyn Provider>> {
        let mut provider: Box<dyn Provider> = match self.constructors.get(provider_type) {
            Some(factory) => factory(),
            None => {
                let binary = self
                    .binary_resolver
                    .as_ref()
                    .and_then(|resolver| resolver.resolve(provider_type))
                    .ok_or_else(|| ProviderError::UnknownType {
                        provider_type: provider_type.to_string(),
                    })?;
                Box::new(manager.spawn(cancel, provider_type, &binary).await?)
            }
        };
        provider.init(cancel, init).await?;
        Ok(provider)
    }
}

impl fmt::Debug for ProviderTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.constructors.keys().collect();
        types.sort_unstable();
        f.debug_struct("ProviderTypeRegistry")
            .field("types", &types)
            .field("binary_resolver", &self.binary_resolver.is_some())
            .finish()
    }
}
