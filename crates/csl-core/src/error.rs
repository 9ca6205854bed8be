/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for compile runs.
 */

//! Error types for compile runs.

use std::path::PathBuf;

use csl_error_reporting::DiagnosticMessage;
use csl_syntax::ParseError;
use thiserror::Error;

use crate::resolve::ResolveError;

/// Errors that abort a compile run.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An input could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path holds no `.csl` files.
    #[error("no .csl files found at {}", path.display())]
    NoInputFiles { path: PathBuf },

    /// An input file is not valid csl.
    #[error("{rendered}")]
    Parse {
        error: ParseError,
        /// `file:line:col: message` with the offending line
        rendered: String,
    },

    /// A reference could not be resolved.
    #[error("{}", .0.located())]
    Resolve(ResolveError),

    #[error("compile cancelled")]
    Cancelled,
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Structured form of this error, for `to_text` or `to_json`
    /// rendering. Parse and resolve errors keep their code, location and
    /// hints.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            Self::Parse { error, .. } => error.diagnostic.clone(),
            Self::Resolve(error) => error.to_diagnostic(),
            other => DiagnosticMessage::error(other.to_string()),
        }
    }
}

impl From<ResolveError> for CompileError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Cancelled => Self::Cancelled,
            other => Self::Resolve(other),
        }
    }
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;
