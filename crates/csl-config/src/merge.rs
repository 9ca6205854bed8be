//! Folding documents into one map.
//!
//! Merge semantics:
//!
//! - map over map: merged key by key, recursively
//! - anything else: the later value replaces the earlier one
//!
//! Lists are replaced as a whole. Merging never fails; a type mismatch is
//! settled by replacement.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::{Map, Value};

/// One converted input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Absolute path of the file the data came from
    pub path: PathBuf,
    pub data: Map,
}

impl Document {
    pub fn new<K, I>(path: impl Into<PathBuf>, entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Document {
            path: path.into(),
            data: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_map(path: impl Into<PathBuf>, data: Map) -> Self {
        Document {
            path: path.into(),
            data,
        }
    }
}

/// Which file last supplied a top-level key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub source: PathBuf,
}

/// Result of [`fold`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folded {
    pub data: Map,
    /// Keyed by top-level key, in the order keys were first seen
    pub provenance: IndexMap<String, Provenance>,
}

/// Fold documents in the given order. Later documents win.
///
/// The caller is responsible for the order (the compiler sorts by absolute
/// path), so folding the same sequence always gives the same result.
pub fn fold(documents: impl IntoIterator<Item = Document>) -> Folded {
    let mut folded = Folded::default();
    for document in documents {
        for key in document.data.keys() {
            folded.provenance.insert(
                key.clone(),
                Provenance {
                    source: document.path.clone(),
                },
            );
        }
        merge_maps(&mut folded.data, document.data);
    }
    folded
}

/// Merge `incoming` into `target`, key by key.
pub fn merge_maps(target: &mut Map, incoming: Map) {
    for (key, value) in incoming {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Merge `incoming` over `existing` in place.
pub fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Map(existing), Value::Map(incoming)) => merge_maps(existing, incoming),
        (existing, incoming) => *existing = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(path: &str, json: serde_json::Value) -> Document {
        match Value::from(json) {
            Value::Map(data) => Document::from_map(path, data),
            other => panic!("fixture must be an object, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_database_override() {
        let base = doc(
            "/cfg/base.csl",
            json!({"database": {"host": "localhost", "port": "5432"}}),
        );
        let over = doc(
            "/cfg/override.csl",
            json!({"database": {"port": "5433", "ssl": "true"}}),
        );

        let folded = fold(vec![base, over]);
        assert_eq!(
            Value::Map(folded.data.clone()).to_json(),
            json!({"database": {"host": "localhost", "port": "5433", "ssl": "true"}})
        );
        assert_eq!(
            folded.provenance["database"].source,
            PathBuf::from("/cfg/override.csl")
        );
    }

    #[test]
    fn test_fold_is_order_dependent_but_deterministic() {
        let a = doc("/a.csl", json!({"k": "a", "only_a": "1"}));
        let b = doc("/b.csl", json!({"k": "b"}));

        let ab = fold(vec![a.clone(), b.clone()]);
        assert_eq!(ab, fold(vec![a.clone(), b.clone()]));

        let ba = fold(vec![b, a]);
        assert_eq!(ab.data["k"], Value::from("b"));
        assert_eq!(ba.data["k"], Value::from("a"));
    }

    #[test]
    fn test_provenance_for_untouched_keys() {
        let folded = fold(vec![
            doc("/1.csl", json!({"x": "1", "shared": "1"})),
            doc("/2.csl", json!({"y": "2", "shared": "2"})),
            doc("/3.csl", json!({"shared": "3"})),
        ]);
        assert_eq!(folded.provenance["x"].source, PathBuf::from("/1.csl"));
        assert_eq!(folded.provenance["y"].source, PathBuf::from("/2.csl"));
        assert_eq!(folded.provenance["shared"].source, PathBuf::from("/3.csl"));
        let keys: Vec<_> = folded.provenance.keys().cloned().collect();
        assert_eq!(keys, vec!["x", "shared", "y"]);
    }

    #[test]
    fn test_lists_are_replaced() {
        let folded = fold(vec![
            doc("/1.csl", json!({"ports": ["80", "443"]})),
            doc("/2.csl", json!({"ports": ["8080"]})),
        ]);
        assert_eq!(folded.data["ports"].to_json(), json!(["8080"]));
    }

    #[test]
    fn test_scalar_replaces_map_and_back() {
        let folded = fold(vec![
            doc("/1.csl", json!({"region": {"name": "eu"}, "tier": "gold"})),
            doc("/2.csl", json!({"region": "us-west-2", "tier": {"level": "1"}})),
        ]);
        assert_eq!(
            Value::Map(folded.data).to_json(),
            json!({"region": "us-west-2", "tier": {"level": "1"}})
        );
    }

    #[test]
    fn test_top_level_scalar_stays_scalar() {
        let folded = fold(vec![doc("/r.csl", json!({"region": "us-west-2"}))]);
        assert_eq!(Value::Map(folded.data).to_json(), json!({"region": "us-west-2"}));
    }

    #[test]
    fn test_null_replaces() {
        let mut existing = Value::from(json!({"a": {"b": "1"}}));
        merge_value(&mut existing, Value::from(json!({"a": null})));
        assert_eq!(existing.to_json(), json!({"a": null}));
    }
}
