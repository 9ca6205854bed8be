/*
 * resolve/walk.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Depth-first resolution with an explicit stack.
 */

//! Depth-first resolution of one reference.
//!
//! The walk keeps its own frame stack instead of recursing, so chains of
//! references of any length resolve without growing the call stack. The
//! identifiers of the frames form the [`ResolutionStack`]; meeting one of
//! them again is a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use csl_config::{Reference, Value};

use super::error::ResolveError;
use super::fetch::{FetchTable, Fetcher};
use super::interpolate::substitute;

/// Fully resolved value (or failure) per identifier, for one run.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, Result<Value, ResolveError>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Result<Value, ResolveError>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn insert(&self, id: String, outcome: Result<Value, ResolveError>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, outcome);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifiers currently being resolved, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStack {
    ids: Vec<String>,
}

impl ResolutionStack {
    pub fn push(&mut self, id: String) {
        self.ids.push(id);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.ids.pop()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    /// The stack followed by `repeated`, as reported in a cycle error.
    pub fn cycle_through(&self, repeated: &str) -> Vec<String> {
        let mut cycle = self.ids.clone();
        cycle.push(repeated.to_string());
        cycle
    }
}

struct Frame {
    id: String,
    raw: Value,
    /// References in `raw`, one per identifier
    deps: Vec<Reference>,
    next: usize,
    resolved: HashMap<String, Value>,
}

impl Frame {
    fn new(id: String, raw: Value) -> Self {
        let mut deps = raw.references();
        let mut seen = HashSet::new();
        deps.retain(|r| seen.insert(r.identifier()));
        Self {
            id,
            raw,
            deps,
            next: 0,
            resolved: HashMap::new(),
        }
    }

    fn substitute(self) -> Result<Value, ResolveError> {
        let resolved = self.resolved;
        substitute(self.raw, &|reference: &Reference| {
            resolved
                .get(&reference.identifier())
                .cloned()
                .ok_or_else(|| ResolveError::NotFound {
                    reference: reference.clone(),
                    message: "reference was not resolved".to_string(),
                })
        })
    }
}

/// Outcome of looking at a reference before descending into it.
enum Step {
    Done(Result<Value, ResolveError>),
    Descend(Frame),
}

/// Resolves references against a fetch table and a resolution cache.
pub(crate) struct Walker<'a> {
    pub(crate) fetcher: &'a Fetcher,
    pub(crate) table: &'a mut FetchTable,
    pub(crate) cache: &'a ResolutionCache,
}

impl Walker<'_> {
    /// Fully resolve `root`: fetch it, then resolve every reference inside
    /// the fetched value, transitively.
    pub(crate) async fn resolve(&mut self, root: &Reference) -> Result<Value, ResolveError> {
        let mut stack = ResolutionStack::default();
        let mut frames: Vec<Frame> = Vec::new();

        let mut returned = match self.step(&stack, root).await {
            Step::Done(outcome) => return outcome,
            Step::Descend(frame) => {
                stack.push(frame.id.clone());
                frames.push(frame);
                None
            }
        };

        loop {
            let Some(frame) = frames.last_mut() else {
                // The root frame always returns before the stack empties.
                return Err(ResolveError::Cancelled);
            };

            let failure = match returned.take() {
                Some((dep_id, Ok(value))) => {
                    frame.resolved.insert(dep_id, value);
                    None
                }
                Some((_, Err(e))) => Some(e),
                None => None,
            };

            let outcome = match failure {
                Some(e) => Err(e),
                None if frame.next < frame.deps.len() => {
                    let dep = frame.deps[frame.next].clone();
                    frame.next += 1;
                    match self.step(&stack, &dep).await {
                        Step::Done(outcome) => {
                            returned = Some((dep.identifier(), outcome));
                        }
                        Step::Descend(child) => {
                            stack.push(child.id.clone());
                            frames.push(child);
                        }
                    }
                    continue;
                }
                None => {
                    let Some(frame) = frames.pop() else {
                        return Err(ResolveError::Cancelled);
                    };
                    stack.pop();
                    let id = frame.id.clone();
                    let outcome = frame.substitute();
                    self.cache.insert(id.clone(), outcome.clone());
                    if frames.is_empty() {
                        return outcome;
                    }
                    returned = Some((id, outcome));
                    continue;
                }
            };

            // A dependency failed: this frame fails with the same error.
            let Some(frame) = frames.pop() else {
                return outcome;
            };
            stack.pop();
            self.cache.insert(frame.id.clone(), outcome.clone());
            if frames.is_empty() {
                return outcome;
            }
            returned = Some((frame.id, outcome));
        }
    }

    async fn step(&mut self, stack: &ResolutionStack, reference: &Reference) -> Step {
        let id = reference.identifier();
        if let Some(cached) = self.cache.get(&id) {
            return Step::Done(cached);
        }
        if stack.contains(&id) {
            let cycle = stack.cycle_through(&id);
            tracing::debug!(cycle = %cycle.join(" → "), "circular reference");
            return Step::Done(Err(ResolveError::CircularReference {
                cycle,
                reference: reference.clone(),
            }));
        }
        match self.fetcher.fetch_cached(reference, self.table).await {
            Ok(raw) => Step::Descend(Frame::new(id, raw)),
            Err(e) => {
                self.cache.insert(id, Err(e.clone()));
                Step::Done(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_cycle_path() {
        let mut stack = ResolutionStack::default();
        stack.push("a:.".into());
        stack.push("b:.".into());
        assert!(stack.contains("a:."));
        assert!(!stack.contains("c:."));
        assert_eq!(stack.cycle_through("a:."), vec!["a:.", "b:.", "a:."]);
        assert_eq!(stack.pop().as_deref(), Some("b:."));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = ResolutionCache::new();
        assert!(cache.is_empty());
        cache.insert("a:x".into(), Ok(Value::from("1")));
        cache.insert("a:y".into(), Err(ResolveError::Cancelled));
        assert_eq!(cache.get("a:x"), Some(Ok(Value::from("1"))));
        assert_eq!(cache.get("a:y"), Some(Err(ResolveError::Cancelled)));
        assert_eq!(cache.get("a:z"), None);
        assert_eq!(cache.len(), 2);
    }
}
