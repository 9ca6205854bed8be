//! Error reporting and diagnostic messages for csl.
//!
//! This crate provides a structured approach to error reporting:
//!
//! - [`DiagnosticMessage`]: the main message structure (title, problem,
//!   details, hints, optional source location)
//! - [`DiagnosticMessageBuilder`]: tidyverse-style builder API
//! - [`catalog`]: stable error codes (`CSL-<subsystem>-<n>`)
//! - [`render`]: the compact `file:line:col: message` rendering with a
//!   source snippet and caret, consumed by downstream tooling
//!
//! # Example
//!
//! ```
//! use csl_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Reference not found")
//!     .with_code("CSL-2-2")
//!     .problem("`database.host` does not exist in `base`")
//!     .add_hint("Check the spelling of the path?")
//!     .build();
//!
//! assert!(error.to_text().contains("Reference not found"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;
pub mod render;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
pub use render::render_located;
