//! The value tree shared by the converter, the merge and the resolver.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::reference::{Fragment, Reference, Template, TemplatePart, scan_references};

/// Ordered map of values. Insertion order is the order keys were first seen.
pub type Map = IndexMap<String, Value>;

/// A configuration value.
///
/// Literal scalars produced by the `.csl` converter are always strings;
/// numbers and booleans come from providers (JSON values fetched over RPC
/// or built in memory).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(Map),
    /// A field that is exactly one reference token; resolved in map mode.
    Reference(Reference),
    /// A string mixing literal text and reference tokens.
    Template(Template),
}

impl Value {
    /// Short name of the variant, used in type mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Reference(_) => "reference",
            Value::Template(_) => "template",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Navigate nested maps (and lists, by decimal index) along `path`.
    ///
    /// An empty path returns `self`.
    ///
    /// ```
    /// use csl_config::{Map, Value};
    ///
    /// let mut db = Map::new();
    /// db.insert("host".into(), Value::from("localhost"));
    /// let mut root = Map::new();
    /// root.insert("database".into(), Value::Map(db));
    /// let root = Value::Map(root);
    ///
    /// let path = ["database".to_string(), "host".to_string()];
    /// assert_eq!(root.get_path(&path), Some(&Value::from("localhost")));
    /// assert_eq!(root.get_path(&path[..1]).and_then(|v| v.get("port")), None);
    /// ```
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter().try_fold(self, |current, segment| {
            let segment = segment.as_ref();
            match current {
                Value::Map(m) => m.get(segment),
                Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
        })
    }

    /// Text used when this value is interpolated into a string.
    ///
    /// Only strings, numbers and booleans can be interpolated.
    pub fn interpolation_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Collect every reference in this tree, in document order.
    ///
    /// Plain strings are scanned for embedded tokens too, since values
    /// fetched from remote providers arrive as plain JSON strings.
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<Reference>) {
        match self {
            Value::Reference(r) => out.push(r.clone()),
            Value::Template(t) => out.extend(t.references().cloned()),
            Value::String(s) if s.contains('@') => {
                out.extend(scan_references(s).into_iter().filter_map(|f| match f {
                    Fragment::Token { reference, .. } => Some(reference),
                    Fragment::Literal(_) => None,
                }))
            }
            Value::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Map(m) => m.values().for_each(|v| v.collect_references(out)),
            _ => {}
        }
    }

    /// Whether any reference remains anywhere in this tree.
    pub fn has_references(&self) -> bool {
        match self {
            Value::Reference(_) | Value::Template(_) => true,
            Value::String(s) => s.contains('@') && crate::contains_reference(s),
            Value::List(items) => items.iter().any(Value::has_references),
            Value::Map(m) => m.values().any(Value::has_references),
            _ => false,
        }
    }

    /// Convert to JSON. Reference nodes render as their token text.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(m) => Json::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Reference(r) => Json::String(r.to_string()),
            Value::Template(t) => Json::String(t.to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(m) => Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Reference(r)
    }
}

impl From<Template> for Value {
    fn from(t: Template) -> Self {
        // A template made of one reference and nothing else is a reference.
        match t.parts.as_slice() {
            [TemplatePart::Reference(r)] => Value::Reference(r.clone()),
            _ => Value::Template(t),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(m) => m.serialize(serializer),
            Value::Reference(r) => serializer.collect_str(r),
            Value::Template(t) => serializer.collect_str(t),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
