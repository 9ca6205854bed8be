/*
 * resolve/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reference resolution over folded data.
 */

//! Reference resolution over folded data.
//!
//! Resolution runs in two phases:
//!
//! 1. **Fetch**: every identifier reachable from the data is fetched, wave
//!    by wave, with at most `max_concurrent_providers` fetches in flight
//!    (see [`fetch`]).
//! 2. **Resolve**: each field holding a reference is resolved in document
//!    order by a depth-first walk over the fetched values, which substitutes
//!    nested references and detects cycles (see [`walk`]).
//!
//! Every identifier is fetched at most once and resolved at most once per
//! run. Phase 2 fetches anything phase 1 skipped, so the outcome does not
//! depend on how far prefetching got.

mod error;
mod fetch;
mod interpolate;
mod walk;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use csl_config::{Map, Reference, Value, contains_reference};

pub use error::ResolveError;
pub use walk::{ResolutionCache, ResolutionStack};

use crate::cancellation::Cancellation;
use crate::options::Timeouts;
use crate::provider::ProviderArena;
use fetch::{FetchTable, Fetcher};
use interpolate::substitute;
use walk::Walker;

/// Resolved data and the failures recorded along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub data: Map,
    /// Empty unless failures are allowed; each failed field is `null`
    pub errors: Vec<ResolveError>,
}

impl Resolved {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolves every reference in a folded document.
pub struct Resolver {
    fetcher: Fetcher,
    cancel: Cancellation,
    allow_missing: bool,
}

impl Resolver {
    pub fn new(arena: Arc<ProviderArena>, cancel: &Cancellation, timeouts: &Timeouts) -> Self {
        Self {
            fetcher: Fetcher::new(arena, cancel.clone(), timeouts),
            cancel: cancel.clone(),
            allow_missing: false,
        }
    }

    /// Record failing fields as `null` instead of failing.
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// Replace every reference in `data` by its resolved value.
    ///
    /// Fails on the first failing field (in document order) unless
    /// [`allow_missing`](Self::allow_missing) is set. Cancellation always
    /// fails.
    pub async fn resolve(&self, mut data: Map) -> Result<Resolved, ResolveError> {
        let roots: Vec<Reference> = data.values().flat_map(Value::references).collect();
        if roots.is_empty() {
            return Ok(Resolved {
                data,
                errors: Vec::new(),
            });
        }

        let mut table = FetchTable::new();
        self.fetcher
            .prefetch(roots, &mut table, !self.allow_missing)
            .await?;

        let cache = ResolutionCache::new();
        let mut walker = Walker {
            fetcher: &self.fetcher,
            table: &mut table,
            cache: &cache,
        };
        let mut errors = Vec::new();

        for path in fields(&data) {
            if self.cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let Some(node) = node_mut(&mut data, &path) else {
                continue;
            };
            let value = std::mem::take(node);
            let references = value.references();
            let fallback = references.first().and_then(|r| r.source.clone());

            let mut resolved = HashMap::new();
            let mut failure = None;
            let mut seen = HashSet::new();
            for reference in references {
                let id = reference.identifier();
                if !seen.insert(id.clone()) {
                    continue;
                }
                match walker.resolve(&reference).await {
                    Ok(v) => {
                        resolved.insert(id, v);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            let outcome = match failure {
                Some(e) => Err(e),
                None => substitute(value, &|reference: &Reference| {
                    resolved
                        .get(&reference.identifier())
                        .cloned()
                        .ok_or_else(|| ResolveError::NotFound {
                            reference: reference.clone(),
                            message: "reference was not resolved".to_string(),
                        })
                }),
            };

            match outcome {
                Ok(v) => *node = v,
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(e) => {
                    let e = e.with_fallback_location(fallback.as_ref());
                    if !self.allow_missing {
                        return Err(e);
                    }
                    tracing::warn!(field = %display_field(&path), error = %e.located(), "unresolved field");
                    *node = Value::Null;
                    errors.push(e);
                }
            }
        }

        tracing::debug!(
            fetched = table.len(),
            resolved = cache.len(),
            errors = errors.len(),
            "resolution done"
        );
        Ok(Resolved { data, errors })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Paths of every node holding a reference, in document order.
fn fields(data: &Map) -> Vec<Vec<Segment>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    for (key, value) in data {
        path.push(Segment::Key(key.clone()));
        collect_fields(value, &mut path, &mut out);
        path.pop();
    }
    out
}

fn collect_fields(value: &Value, path: &mut Vec<Segment>, out: &mut Vec<Vec<Segment>>) {
    match value {
        Value::Reference(_) | Value::Template(_) => out.push(path.clone()),
        Value::String(text) if contains_reference(text) => out.push(path.clone()),
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(Segment::Index(i));
                collect_fields(item, path, out);
                path.pop();
            }
        }
        Value::Map(map) => {
            for (key, item) in map {
                path.push(Segment::Key(key.clone()));
                collect_fields(item, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

fn node_mut<'a>(data: &'a mut Map, path: &[Segment]) -> Option<&'a mut Value> {
    let (Segment::Key(first), rest) = path.split_first()? else {
        return None;
    };
    rest.iter()
        .try_fold(data.get_mut(first)?, |node, segment| match (node, segment) {
            (Value::Map(map), Segment::Key(key)) => map.get_mut(key),
            (Value::List(items), Segment::Index(i)) => items.get_mut(*i),
            _ => None,
        })
}

fn display_field(path: &[Segment]) -> String {
    path.iter()
        .map(|segment| match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(i) => i.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
