/*
 * resolve/error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Errors raised while resolving references.
 */

//! Errors raised while resolving references.

use std::time::Duration;

use csl_config::Reference;
use csl_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, get_error_info};
use csl_source_map::SourceInfo;
use thiserror::Error;

use crate::provider::{PROVIDER_DIR_ENV, ProviderError, binary_name};

/// Errors from the reference resolver.
///
/// `Clone` because results are cached per identifier: every reference to
/// a failing identifier reports the same error without fetching again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("no provider is registered for alias `{}` (in `{reference}`)", reference.alias)]
    ProviderNotRegistered { reference: Reference },

    #[error("reference `{reference}` not found: {message}")]
    NotFound { reference: Reference, message: String },

    #[error("circular reference: {}", cycle.join(" → "))]
    CircularReference {
        /// Identifiers on the resolution stack, then the repeated one
        cycle: Vec<String>,
        /// Reference that closed the cycle
        reference: Reference,
    },

    #[error("provider `{}` failed for `{reference}`: {message}", reference.alias)]
    Provider { reference: Reference, message: String },

    /// Neither an in-process constructor nor an executable exists.
    #[error(
        "no implementation of provider type `{provider_type}` for alias `{}` (in `{reference}`)",
        reference.alias
    )]
    UnknownProviderType {
        reference: Reference,
        provider_type: String,
    },

    /// An executable exists but could not be started or did not answer.
    #[error("provider `{}` is unreachable (in `{reference}`): {message}", reference.alias)]
    ProviderUnreachable { reference: Reference, message: String },

    #[error("fetching `{reference}` timed out after {after:?}")]
    Timeout { reference: Reference, after: Duration },

    #[error("invalid reference `{token}`: {message}")]
    InvalidReference {
        token: String,
        message: String,
        location: Option<SourceInfo>,
    },

    #[error("cannot interpolate `{reference}` into a string: it resolved to a {found}")]
    TypeMismatch {
        reference: Reference,
        found: &'static str,
    },

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Attach `reference` to a provider-layer error.
    pub fn from_provider(error: ProviderError, reference: &Reference) -> Self {
        let reference = reference.clone();
        match error {
            ProviderError::NotRegistered { .. } => Self::ProviderNotRegistered { reference },
            ProviderError::NotFound(message) => Self::NotFound { reference, message },
            ProviderError::Cancelled => Self::Cancelled,
            ProviderError::UnknownType { provider_type } => Self::UnknownProviderType {
                reference,
                provider_type,
            },
            unreachable @ ProviderError::Unreachable { .. } => Self::ProviderUnreachable {
                reference,
                message: unreachable.to_string(),
            },
            other => Self::Provider {
                reference,
                message: other.to_string(),
            },
        }
    }

    /// The reference this error is about, if any.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Self::ProviderNotRegistered { reference }
            | Self::NotFound { reference, .. }
            | Self::CircularReference { reference, .. }
            | Self::Provider { reference, .. }
            | Self::UnknownProviderType { reference, .. }
            | Self::ProviderUnreachable { reference, .. }
            | Self::Timeout { reference, .. }
            | Self::TypeMismatch { reference, .. } => Some(reference),
            Self::InvalidReference { .. } | Self::Cancelled => None,
        }
    }

    /// Where the offending token was written.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Self::InvalidReference { location, .. } => location.as_ref(),
            _ => self.reference().and_then(|r| r.source.as_ref()),
        }
    }

    /// Use `fallback` as the location when the error has none, e.g. for
    /// references that arrived from a remote provider as plain strings.
    pub fn with_fallback_location(mut self, fallback: Option<&SourceInfo>) -> Self {
        if self.location().is_some() {
            return self;
        }
        let Some(fallback) = fallback else {
            return self;
        };
        match &mut self {
            Self::InvalidReference { location, .. } => *location = Some(fallback.clone()),
            Self::ProviderNotRegistered { reference }
            | Self::NotFound { reference, .. }
            | Self::CircularReference { reference, .. }
            | Self::Provider { reference, .. }
            | Self::UnknownProviderType { reference, .. }
            | Self::ProviderUnreachable { reference, .. }
            | Self::Timeout { reference, .. }
            | Self::TypeMismatch { reference, .. } => reference.source = Some(fallback.clone()),
            Self::Cancelled => {}
        }
        self
    }

    /// `file:line:col: message`, or just the message without a location.
    pub fn located(&self) -> String {
        match self.location() {
            Some(location) => format!("{location}: {self}"),
            None => self.to_string(),
        }
    }

    /// Error code from the diagnostic catalog.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProviderNotRegistered { .. } => "CSL-2-1",
            Self::NotFound { .. } => "CSL-2-2",
            Self::CircularReference { .. } => "CSL-2-3",
            Self::Provider { .. } => "CSL-2-4",
            Self::Timeout { .. } => "CSL-2-5",
            Self::InvalidReference { .. } => "CSL-2-6",
            Self::TypeMismatch { .. } => "CSL-2-7",
            Self::Cancelled => "CSL-2-8",
            Self::UnknownProviderType { .. } => "CSL-2-9",
            Self::ProviderUnreachable { .. } => "CSL-2-10",
        }
    }

    /// Diagnostic whose headline is this error's message, with the
    /// catalog's explanation as a note and hints where there are any.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let mut builder = DiagnosticMessageBuilder::error(self.to_string())
            .with_code(self.code())
            .with_optional_location(self.location().cloned());
        if let Some(info) = get_error_info(self.code()) {
            builder = builder.add_note(info.message_template.clone());
        }
        let builder = match self {
            Self::ProviderNotRegistered { reference } => builder.add_hint(format!(
                "Declare a `source:` block with `alias: {}`, or register the alias in code?",
                reference.alias
            )),
            Self::CircularReference { cycle, .. } => cycle
                .iter()
                .fold(builder, |b, id| b.add_info(format!("via `{id}`"))),
            Self::Timeout { .. } => {
                builder.add_hint("Raise `Timeouts::per_provider_fetch` for slow providers?")
            }
            Self::UnknownProviderType { provider_type, .. } => builder.add_hint(format!(
                "Put `{}` in `{PROVIDER_DIR_ENV}` or on PATH?",
                binary_name(provider_type)
            )),
            _ => builder,
        };
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csl_source_map::Location;

    fn reference() -> Reference {
        Reference::new("base", vec!["app".into(), "db".into()])
    }

    fn location() -> SourceInfo {
        SourceInfo::point(
            "/cfg/app.csl",
            Location {
                offset: 5,
                row: 1,
                column: 5,
            },
        )
    }

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::CircularReference {
            cycle: vec!["a:.".into(), "b:.".into(), "a:.".into()],
            reference: Reference::root("a"),
        };
        assert_eq!(err.to_string(), "circular reference: a:. → b:. → a:.");
    }

    #[test]
    fn test_from_provider_keeps_not_found_distinct() {
        let r = reference();
        let not_found = ResolveError::from_provider(ProviderError::not_found(&r.path), &r);
        assert!(matches!(not_found, ResolveError::NotFound { .. }));
        assert_eq!(
            not_found.to_string(),
            "reference `@base:app.db` not found: `app.db` does not exist"
        );

        let rpc = ResolveError::from_provider(ProviderError::rpc("broken pipe"), &r);
        assert_eq!(
            rpc.to_string(),
            "provider `base` failed for `@base:app.db`: RPC error: broken pipe"
        );

        let unknown = ResolveError::from_provider(
            ProviderError::UnknownType {
                provider_type: "vault".into(),
            },
            &r,
        );
        assert!(matches!(
            unknown,
            ResolveError::UnknownProviderType { ref provider_type, .. } if provider_type == "vault"
        ));
        assert_eq!(unknown.code(), "CSL-2-9");

        let unreachable = ResolveError::from_provider(
            ProviderError::Unreachable {
                provider_type: "vault".into(),
                binary: "/opt/csl-provider-vault".into(),
                message: "no health response within 10s".into(),
            },
            &r,
        );
        assert!(matches!(unreachable, ResolveError::ProviderUnreachable { .. }));
        assert_eq!(unreachable.code(), "CSL-2-10");

        let unregistered = ResolveError::from_provider(
            ProviderError::NotRegistered {
                alias: "base".into(),
            },
            &r,
        );
        assert!(matches!(unregistered, ResolveError::ProviderNotRegistered { .. }));
    }

    #[test]
    fn test_fallback_location_only_fills_gaps() {
        let err = ResolveError::NotFound {
            reference: reference(),
            message: "gone".into(),
        };
        assert_eq!(err.located(), err.to_string());

        let located = err.with_fallback_location(Some(&location()));
        assert_eq!(
            located.located(),
            "/cfg/app.csl:2:6: reference `@base:app.db` not found: gone"
        );

        let other = SourceInfo::point("/cfg/other.csl", Location::default());
        let kept = located.clone().with_fallback_location(Some(&other));
        assert_eq!(kept, located);

        assert_eq!(
            ResolveError::Cancelled.with_fallback_location(Some(&other)),
            ResolveError::Cancelled
        );
    }

    #[test]
    fn test_diagnostic_carries_code_and_location() {
        let err = ResolveError::ProviderNotRegistered {
            reference: reference().with_source(location()),
        };
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("CSL-2-1"));
        assert_eq!(diagnostic.headline(), err.to_string());
        assert_eq!(diagnostic.location, Some(location()));
        assert_eq!(diagnostic.hints.len(), 1);
        assert_eq!(diagnostic.details.len(), 1);

        let text = diagnostic.to_text();
        assert!(text.starts_with("Error [CSL-2-1]: no provider is registered"), "{text}");
        assert!(text.contains("? Declare a `source:` block with `alias: base`"), "{text}");

        let json = diagnostic.to_json();
        assert_eq!(json["code"], "CSL-2-1");
        assert_eq!(json["location"]["line"], 2);
        assert_eq!(json["hints"].as_array().map(Vec::len), Some(1));
    }
}
