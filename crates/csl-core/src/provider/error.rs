/*
 * provider/error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for providers.
 */

//! Error types for providers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by providers and by the registries that build them.
///
/// `Clone` because a failed initialization is cached for the rest of the
/// run, and every reference to that alias reports the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The requested path does not exist in the provider's data.
    #[error("{0}")]
    NotFound(String),

    /// No definition exists for the alias.
    #[error("no provider is registered or declared for alias `{alias}`")]
    NotRegistered { alias: String },

    /// No in-process constructor and no executable for the type.
    #[error("unknown provider type `{provider_type}`")]
    UnknownType { provider_type: String },

    /// An executable exists but could not be started or did not answer.
    #[error("provider `{provider_type}` at {} is unreachable: {message}", binary.display())]
    Unreachable {
        provider_type: String,
        binary: PathBuf,
        message: String,
    },

    /// `init` failed.
    #[error("provider `{alias}` failed to initialize: {message}")]
    Init { alias: String, message: String },

    /// Transport or protocol failure talking to a remote provider.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The call was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Provider-specific failure.
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// A "path not found" error for `path`.
    pub fn not_found(path: &[String]) -> Self {
        Self::NotFound(format!("`{}` does not exist", display_path(path)))
    }

    pub fn init(alias: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Init {
            alias: alias.into(),
            message: message.into(),
        }
    }

    pub fn rpc(message: impl ToString) -> Self {
        Self::Rpc(message.to_string())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Dotted path, or `.` for the whole resource.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path.join(".")
    }
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
