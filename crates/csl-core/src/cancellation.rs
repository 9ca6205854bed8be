/*
 * cancellation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cancellation token with an optional deadline.
 */

//! Cancellation for a compile run.
//!
//! [`Cancellation`] wraps `tokio_util::sync::CancellationToken` and adds an
//! optional deadline. Every provider `init` and `fetch` receives one and
//! must stop when it fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A cancellation token that also fires when its deadline passes.
///
/// Clones share state: cancelling one cancels all of them.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Create a new cancellation token with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Return a token sharing this one's cancellation state, with a
    /// deadline no later than `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            inner: self.inner.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if cancellation has been requested or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.cancel()
    }

    /// Completes when the token is cancelled or the deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.cancelled().await,
        }
    }

    /// Run `future` unless cancellation fires first.
    ///
    /// Returns `None` when cancelled.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}

impl From<CancellationToken> for Cancellation {
    fn from(token: CancellationToken) -> Self {
        Self {
            inner: token,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_not_cancelled() {
        let token = Cancellation::new();
        assert!(!token.is_cancelled());
        assert!(token.deadline().is_none());
    }

    #[test]
    fn test_clone_shares_state() {
        let token1 = Cancellation::new();
        let token2 = token1.clone();

        token1.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let token = Cancellation::with_timeout(Duration::from_millis(10));
        assert!(!token.is_cancelled());
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_returns_none_when_cancelled() {
        let token = Cancellation::new();
        token.cancel();
        let out = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                1
            })
            .await;
        assert_eq!(out, None);

        assert_eq!(Cancellation::new().run(async { 2 }).await, Some(2));
    }

    #[test]
    fn test_with_deadline_keeps_earlier() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);
        let token = Cancellation::new().with_deadline(soon).with_deadline(later);
        assert_eq!(token.deadline(), Some(soon));
    }
}
