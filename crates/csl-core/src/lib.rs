//! Merge and reference resolution engine for csl configuration.
//!
//! [`compile`] turns a directory of `.csl` files into one [`Snapshot`]:
//! files are deep-merged in path order, then every reference
//! (`@alias:path`) is resolved through the provider bound to its alias.
//!
//! # Architecture
//!
//! - [`provider`]: the [`Provider`](provider::Provider) trait, built-in
//!   providers, registries, remote providers and the per-run
//!   [`ProviderArena`](provider::ProviderArena)
//! - [`resolve`]: the two-phase resolver (bounded concurrent fetching, then
//!   a depth-first walk with cycle detection)
//! - [`Cancellation`]: cancellation token with an optional deadline, passed
//!   to every provider call
//!
//! # Example
//!
//! ```ignore
//! use csl_core::{Cancellation, Options, compile};
//!
//! let snapshot = compile(&Cancellation::new(), Options::new("configs/")).await?;
//! println!("{}", serde_json::to_string_pretty(&snapshot)?);
//! ```

pub mod cancellation;
pub mod compile;
pub mod discovery;
pub mod error;
pub mod options;
pub mod provider;
pub mod resolve;
pub mod snapshot;

// Re-export commonly used types
pub use cancellation::Cancellation;
pub use compile::compile;
pub use discovery::discover_files;
pub use error::{CompileError, Result};
pub use options::{Options, Timeouts};
pub use resolve::{ResolveError, Resolved, Resolver};
pub use snapshot::{Metadata, Snapshot};
