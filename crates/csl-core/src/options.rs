/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Options for a compile run.
 */

//! Options for a compile run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::{ProviderRegistry, ProviderTypeRegistry};

/// Default bound on one provider `fetch`.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of fetches in flight at once.
pub const DEFAULT_MAX_CONCURRENT_PROVIDERS: usize = 4;

/// Limits on provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on each `fetch`; `None` waits indefinitely
    pub per_provider_fetch: Option<Duration>,
    /// Fetches in flight at once; `0` is treated as `1`
    pub max_concurrent_providers: usize,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            per_provider_fetch: Some(DEFAULT_FETCH_TIMEOUT),
            max_concurrent_providers: DEFAULT_MAX_CONCURRENT_PROVIDERS,
        }
    }
}

/// What to compile and how.
///
/// ```ignore
/// let options = Options::new("configs/")
///     .with_var("env", "prod")
///     .allow_missing_provider(true);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// A `.csl` file or a directory of them
    pub path: PathBuf,
    /// Aliases registered in code. These win over `source:` declarations.
    pub provider_registry: ProviderRegistry,
    pub provider_type_registry: ProviderTypeRegistry,
    /// Values for `${name}` substitution
    pub vars: HashMap<String, String>,
    /// Record resolution failures and keep going instead of failing
    pub allow_missing_provider: bool,
    pub timeouts: Timeouts,
}

impl Options {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            provider_registry: ProviderRegistry::new(),
            provider_type_registry: ProviderTypeRegistry::with_builtin(),
            vars: HashMap::new(),
            allow_missing_provider: false,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_provider_registry(mut self, registry: ProviderRegistry) -> Self {
        self.provider_registry = registry;
        self
    }

    pub fn with_provider_type_registry(mut self, registry: ProviderTypeRegistry) -> Self {
        self.provider_type_registry = registry;
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn allow_missing_provider(mut self, allow: bool) -> Self {
        self.allow_missing_provider = allow;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeouts.per_provider_fetch = timeout;
        self
    }

    pub fn with_max_concurrent_providers(mut self, max: usize) -> Self {
        self.timeouts.max_concurrent_providers = max;
        self
    }
}
