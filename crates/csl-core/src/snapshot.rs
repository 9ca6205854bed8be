/*
 * snapshot.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The result of a compile run.
 */

//! The result of a compile run.

use std::path::PathBuf;
use std::time::SystemTime;

use csl_config::{Map, Provenance, Value};
use indexmap::IndexMap;
use serde::Serialize;

/// Merged, resolved configuration plus how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub data: Map,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Absolute paths, in merge order
    pub input_files: Vec<PathBuf>,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    /// Last file to touch each top-level key
    pub per_key_provenance: IndexMap<String, Provenance>,
    /// Rendered resolution failures; only filled when missing providers
    /// are allowed
    pub errors: Vec<String>,
    /// The same failures as structured diagnostics (code, location, notes
    /// and hints), in the same order as `errors`
    pub diagnostics: Vec<serde_json::Value>,
}

impl Snapshot {
    /// Value at a dotted path, e.g. `database.host`.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let first = self.data.get(segments.next()?)?;
        let rest: Vec<&str> = segments.collect();
        first.get_path(&rest)
    }

    /// `true` when every reference resolved.
    pub fn is_complete(&self) -> bool {
        self.metadata.errors.is_empty()
    }

    /// The data as JSON. References never remain after a compile.
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.data.clone()).to_json()
    }
}
