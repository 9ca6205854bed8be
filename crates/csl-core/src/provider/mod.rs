/*
 * provider/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Data providers behind reference aliases.
 */

//! Data providers behind reference aliases.
//!
//! Every reference `@alias:path` is answered by the provider bound to
//! `alias`. Providers run either in-process ([`FileProvider`],
//! [`MemoryProvider`], or anything registered in code) or as separate
//! executables spoken to over the [`remote`] protocol. Both sit behind the
//! same [`Provider`] trait.
//!
//! # Lookup
//!
//! ```text
//! alias ──ProviderRegistry──▶ definition
//!          │ Constructor ─────────────────────────────▶ provider
//!          │ Declared { type } ──ProviderTypeRegistry─▶ in-process constructor
//!          │                                         └▶ BinaryResolver ─▶ ProviderManager::spawn
//! ```
//!
//! [`ProviderArena`] caches the initialized provider per alias for one run.

mod arena;
mod binary;
mod error;
mod file;
mod manager;
mod memory;
mod registry;
pub mod remote;
mod traits;

pub use arena::ProviderArena;
pub use binary::{BinaryResolver, PROVIDER_DIR_ENV, PathBinaryResolver, binary_name};
pub use error::{ProviderError, Result, display_path};
pub use file::{FILE_PROVIDER_TYPE, FileProvider};
pub use manager::ProviderManager;
pub use memory::MemoryProvider;
pub use registry::{ProviderDefinition, ProviderFactory, ProviderRegistry, ProviderTypeRegistry};
pub use traits::{InitOptions, Provider, ProviderInfo};
