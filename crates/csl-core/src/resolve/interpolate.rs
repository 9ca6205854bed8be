/*
 * resolve/interpolate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Substituting resolved values into a value tree.
 */

//! Substituting resolved values into a value tree.
//!
//! - a [`Value::Reference`] is replaced by the referenced value (map mode)
//! - a [`Value::Template`] becomes a string with every token replaced by
//!   the text of its value (interpolation mode)
//! - a plain string that is exactly one token behaves like a reference;
//!   a plain string with tokens among text behaves like a template

use csl_config::{
    Fragment, Reference, Template, TemplatePart, Value, contains_reference, scan_references,
};

use super::error::ResolveError;

/// Replace every reference in `value` using `lookup`.
pub(crate) fn substitute<F>(value: Value, lookup: &F) -> Result<Value, ResolveError>
where
    F: Fn(&Reference) -> Result<Value, ResolveError>,
{
    match value {
        Value::Reference(reference) => lookup(&reference),
        Value::Template(template) => interpolate(&template, lookup).map(Value::String),
        Value::String(text) if text.contains('@') => substitute_text(text, lookup),
        Value::List(items) => items
            .into_iter()
            .map(|item| substitute(item, lookup))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Value::Map(map) => map
            .into_iter()
            .map(|(key, item)| substitute(item, lookup).map(|v| (key, v)))
            .collect::<Result<_, _>>()
            .map(Value::Map),
        other => Ok(other),
    }
}

/// Concatenate literal parts and the text of each referenced value, left
/// to right.
pub(crate) fn interpolate<F>(template: &Template, lookup: &F) -> Result<String, ResolveError>
where
    F: Fn(&Reference) -> Result<Value, ResolveError>,
{
    let mut out = String::new();
    for part in &template.parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Reference(reference) => {
                let value = lookup(reference)?;
                let text = value
                    .interpolation_text()
                    .ok_or_else(|| ResolveError::TypeMismatch {
                        reference: reference.clone(),
                        found: value.type_name(),
                    })?;
                out.push_str(&text);
            }
        }
    }
    Ok(out)
}

fn substitute_text<F>(text: String, lookup: &F) -> Result<Value, ResolveError>
where
    F: Fn(&Reference) -> Result<Value, ResolveError>,
{
    if !contains_reference(&text) {
        return Ok(Value::String(text));
    }
    let mut fragments = scan_references(&text);
    if fragments.len() == 1 {
        if let Some(Fragment::Token { reference, .. }) = fragments.pop() {
            return lookup(&reference);
        }
    }
    let template = Template::from_fragments(fragments, |_, _| None);
    interpolate(&template, lookup).map(Value::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup(reference: &Reference) -> Result<Value, ResolveError> {
        match reference.identifier().as_str() {
            "base:db.host" => Ok(Value::from("localhost")),
            "base:db.port" => Ok(Value::from(json!(5432))),
            "base:db.tls" => Ok(Value::Bool(true)),
            "base:db" => Ok(Value::from(json!({"host": "localhost", "port": 5432}))),
            _ => Err(ResolveError::NotFound {
                reference: reference.clone(),
                message: "missing".into(),
            }),
        }
    }

    fn db(field: &str) -> Reference {
        Reference::new("base", vec!["db".into(), field.into()])
    }

    #[test]
    fn test_map_mode_keeps_structure() {
        let value = Value::Reference(Reference::new("base", vec!["db".into()]));
        assert_eq!(
            substitute(value, &lookup).unwrap().to_json(),
            json!({"host": "localhost", "port": 5432})
        );
    }

    #[test]
    fn test_template_mixes_text_and_scalars() {
        let template = Template {
            parts: vec![
                TemplatePart::Literal("postgres://".into()),
                TemplatePart::Reference(db("host")),
                TemplatePart::Literal(":".into()),
                TemplatePart::Reference(db("port")),
                TemplatePart::Literal("?tls=".into()),
                TemplatePart::Reference(db("tls")),
            ],
        };
        assert_eq!(
            interpolate(&template, &lookup).unwrap(),
            "postgres://localhost:5432?tls=true"
        );
    }

    #[test]
    fn test_interpolating_a_map_is_a_type_mismatch() {
        let template = Template {
            parts: vec![
                TemplatePart::Literal("db=".into()),
                TemplatePart::Reference(Reference::new("base", vec!["db".into()])),
            ],
        };
        let err = interpolate(&template, &lookup).unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { found: "map", .. }));
    }

    #[test]
    fn test_plain_strings_are_scanned() {
        let whole = substitute(Value::from("@base:db"), &lookup).unwrap();
        assert!(whole.as_map().is_some());

        let mixed = substitute(Value::from("host=@base:db.host"), &lookup).unwrap();
        assert_eq!(mixed, Value::from("host=localhost"));

        let email = substitute(Value::from("ops@example.com"), &lookup).unwrap();
        assert_eq!(email, Value::from("ops@example.com"));
    }

    #[test]
    fn test_nested_containers_and_errors() {
        let value = Value::from(json!({"a": ["@base:db.host", 1], "b": {"c": "@base:db.port"}}));
        assert_eq!(
            substitute(value, &lookup).unwrap().to_json(),
            json!({"a": ["localhost", 1], "b": {"c": 5432}})
        );

        let missing = Value::from(json!({"x": "@base:nope"}));
        assert!(matches!(
            substitute(missing, &lookup),
            Err(ResolveError::NotFound { .. })
        ));
    }
}
