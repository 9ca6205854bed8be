/*
 * provider/remote/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Providers running in separate processes.
 */

//! Providers running in separate processes.
//!
//! A remote provider is an executable that speaks the JSON-lines protocol
//! in [`protocol`] on its stdin/stdout. [`serve`] implements the provider
//! side for any [`Provider`](super::Provider); [`RemoteProvider`] is the
//! compiler side.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{RemoteProcess, RemoteProvider, RpcClient};
pub use protocol::{ErrorCode, Method, Request, Response, RpcError};
pub use server::serve;
