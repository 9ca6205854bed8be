/*
 * provider/manager.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Lifecycle of remote provider processes.
 */

//! Lifecycle of remote provider processes.
//!
//! The `ProviderManager` starts provider executables, checks they answer
//! before handing them out, and stops every process it started when the
//! run ends.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use super::error::{ProviderError, Result};
use super::remote::{RemoteProcess, RemoteProvider};
use crate::cancellation::Cancellation;

/// Default time a freshly started provider has to answer `health`.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Starts and stops remote provider processes.
pub struct ProviderManager {
    /// Every process started in this run, in start order.
    processes: Mutex<Vec<Arc<RemoteProcess>>>,
    startup_timeout: Duration,
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderManager {
    pub fn new() -> Self {
        Self::with_startup_timeout(DEFAULT_STARTUP_TIMEOUT)
    }

    pub fn with_startup_timeout(startup_timeout: Duration) -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
            startup_timeout,
        }
    }

    /// Start `binary` as a provider of `provider_type`.
    ///
    /// The process is health-checked before it is returned. It is killed
    /// if it is dropped without [`shutdown`](Self::shutdown).
    pub async fn spawn(
        &self,
        cancel: &Cancellation,
        provider_type: &str,
        binary: &Path,
    ) -> Result<RemoteProvider> {
        let unreachable = |message: String| ProviderError::Unreachable {
            provider_type: provider_type.to_string(),
            binary: binary.to_path_buf(),
            message,
        };

        tracing::debug!(provider_type, binary = %binary.display(), "starting provider");
        let child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| unreachable(e.to_string()))?;

        let process = Arc::new(
            RemoteProcess::from_child(provider_type, binary, child).map_err(unreachable)?,
        );
        self.processes.lock().await.push(process.clone());

        let startup = cancel.with_deadline(tokio::time::Instant::now() + self.startup_timeout);
        match process.health(&startup).await {
            Ok(()) => {}
            Err(ProviderError::Cancelled) if cancel.is_cancelled() => {
                return Err(ProviderError::Cancelled);
            }
            Err(ProviderError::Cancelled) => {
                return Err(unreachable(format!(
                    "no health response within {}s",
                    self.startup_timeout.as_secs()
                )));
            }
            Err(e) => return Err(unreachable(e.to_string())),
        }

        tracing::info!(provider_type, binary = %binary.display(), "provider started");
        Ok(RemoteProvider::new(process))
    }

    /// Number of processes started so far.
    pub async fn process_count(&self) -> usize {
        self.processes.lock().await.len()
    }

    /// Stop every started process.
    ///
    /// Best effort: every process is asked to stop even if an earlier one
    /// fails. Returns one message per failure.
    pub async fn shutdown(&self) -> Vec<String> {
        let processes: Vec<_> = self.processes.lock().await.drain(..).collect();
        let mut errors = Vec::new();
        for process in processes {
            if let Err(message) = process.shutdown().await {
                errors.push(format!(
                    "provider `{}` ({}): {}",
                    process.provider_type(),
                    process.binary().display(),
                    message
                ));
            }
        }
        errors
    }
}
