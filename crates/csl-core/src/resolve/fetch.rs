/*
 * resolve/fetch.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Concurrent, bounded fetching of raw reference values.
 */

//! Fetching raw reference values.
//!
//! Fetches run in waves: every identifier referenced by the data is fetched
//! concurrently, then every identifier referenced by the fetched values,
//! and so on until nothing new turns up. A [`FetchTable`] records each
//! outcome, so every identifier is fetched at most once per run and the
//! walk ends even when references form a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use csl_config::{Reference, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::error::ResolveError;
use crate::cancellation::Cancellation;
use crate::options::Timeouts;
use crate::provider::{ProviderArena, ProviderError};

/// Raw fetch outcome per identifier.
pub(crate) type FetchTable = HashMap<String, Result<Value, ResolveError>>;

/// Fetches raw values under the run's concurrency and timeout limits.
#[derive(Clone)]
pub(crate) struct Fetcher {
    arena: Arc<ProviderArena>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
    cancel: Cancellation,
}

impl Fetcher {
    pub(crate) fn new(arena: Arc<ProviderArena>, cancel: Cancellation, timeouts: &Timeouts) -> Self {
        Self {
            arena,
            permits: Arc::new(Semaphore::new(timeouts.max_concurrent_providers.max(1))),
            timeout: timeouts.per_provider_fetch,
            cancel,
        }
    }

    /// Fetch the raw value of one reference.
    ///
    /// Holds a permit for the provider's initialization and the fetch.
    /// The per-fetch timeout covers `fetch` only.
    pub(crate) async fn fetch(&self, reference: &Reference) -> Result<Value, ResolveError> {
        if let Err(e) = reference.validate() {
            return Err(ResolveError::InvalidReference {
                token: reference.to_string(),
                message: e.to_string(),
                location: reference.source.clone(),
            });
        }

        let work = async {
            let _permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ResolveError::Cancelled)?;

            let provider = self
                .arena
                .get_provider(&self.cancel, &reference.alias)
                .await
                .map_err(|e| ResolveError::from_provider(e, reference))?;

            tracing::trace!(reference = %reference, "fetching");
            let outcome = match self.timeout {
                Some(after) => {
                    let bounded = self
                        .cancel
                        .with_deadline(tokio::time::Instant::now() + after);
                    tokio::time::timeout(after, provider.fetch(&bounded, &reference.path))
                        .await
                        .unwrap_or(Err(ProviderError::Cancelled))
                }
                None => provider.fetch(&self.cancel, &reference.path).await,
            };

            match (outcome, self.timeout) {
                (Ok(value), _) => Ok(value),
                (Err(ProviderError::Cancelled), Some(after)) if !self.cancel.is_cancelled() => {
                    tracing::warn!(reference = %reference, ?after, "fetch timed out");
                    Err(ResolveError::Timeout {
                        reference: reference.clone(),
                        after,
                    })
                }
                (Err(e), _) => Err(ResolveError::from_provider(e, reference)),
            }
        };

        self.cancel
            .run(work)
            .await
            .unwrap_or(Err(ResolveError::Cancelled))
    }

    /// Fetch `reference` unless the table already has it.
    pub(crate) async fn fetch_cached(
        &self,
        reference: &Reference,
        table: &mut FetchTable,
    ) -> Result<Value, ResolveError> {
        let id = reference.identifier();
        if let Some(outcome) = table.get(&id) {
            return outcome.clone();
        }
        let outcome = self.fetch(reference).await;
        table.insert(id, outcome.clone());
        outcome
    }

    /// Fetch everything reachable from `roots`, wave by wave.
    ///
    /// With `fail_fast`, no further wave starts once a wave has a failure.
    /// Only cancellation is returned as an error; fetch failures are left
    /// in the table.
    pub(crate) async fn prefetch(
        &self,
        roots: Vec<Reference>,
        table: &mut FetchTable,
        fail_fast: bool,
    ) -> Result<(), ResolveError> {
        let mut wave = unfetched(roots, table);
        let mut round = 0;

        while !wave.is_empty() {
            if self.cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            round += 1;
            tracing::debug!(round, size = wave.len(), "fetch wave");

            let mut tasks = JoinSet::new();
            for reference in &wave {
                let fetcher = self.clone();
                let reference = reference.clone();
                tasks.spawn(async move {
                    let outcome = fetcher.fetch(&reference).await;
                    (reference.identifier(), outcome)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, outcome)) => {
                        table.insert(id, outcome);
                    }
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(_) => return Err(ResolveError::Cancelled),
                }
            }

            if self.cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let outcomes: Vec<_> = wave
                .iter()
                .filter_map(|r| table.get(&r.identifier()))
                .collect();
            if fail_fast && outcomes.iter().any(|o| o.is_err()) {
                break;
            }
            let next: Vec<Reference> = outcomes
                .into_iter()
                .filter_map(|o| o.as_ref().ok())
                .flat_map(Value::references)
                .collect();
            wave = unfetched(next, table);
        }

        tracing::debug!(identifiers = table.len(), rounds = round, "prefetch done");
        Ok(())
    }
}

/// `references` minus duplicates and identifiers already in `table`, in
/// first-seen order.
fn unfetched(references: Vec<Reference>, table: &FetchTable) -> Vec<Reference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| {
            let id = r.identifier();
            !table.contains_key(&id) && seen.insert(id)
        })
        .collect()
}
