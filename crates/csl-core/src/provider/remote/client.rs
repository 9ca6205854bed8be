/*
 * provider/remote/client.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Client side of the remote provider protocol.
 */

//! Client side of the remote provider protocol.
//!
//! [`RemoteProcess`] owns one provider process and its connection.
//! [`RemoteProvider`] adapts it to the [`Provider`] trait, so the resolver
//! treats remote and in-process providers the same way.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use csl_config::Value;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;

use super::protocol::{Method, Request, Response};
use crate::cancellation::Cancellation;
use crate::provider::error::{ProviderError, Result};
use crate::provider::traits::{InitOptions, Provider, ProviderInfo};

/// How long a provider gets to acknowledge `shutdown` and exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Connection {
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    next_id: u64,
    /// Bytes of a response line not yet complete. Survives a cancelled
    /// call, so the next call resumes at the right place in the stream.
    pending: Vec<u8>,
    /// Set while a request is being written; still set if that write was
    /// cancelled, after which the provider may see a torn request.
    writing: bool,
}

/// One request/response connection. Calls are serialized.
pub struct RpcClient {
    connection: Mutex<Connection>,
}

impl RpcClient {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            connection: Mutex::new(Connection {
                reader: BufReader::new(Box::new(reader) as BoxedReader),
                writer: Box::new(writer),
                next_id: 1,
                pending: Vec::new(),
                writing: false,
            }),
        }
    }

    /// Send one request and wait for its response.
    ///
    /// Responses carrying another id (answers to calls abandoned by an
    /// earlier cancellation) are skipped. A call cancelled while its
    /// request was being written leaves the connection unusable.
    pub async fn call(
        &self,
        cancel: &Cancellation,
        method: Method,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut guard = self.connection.lock().await;
        let connection = &mut *guard;
        if connection.writing {
            return Err(ProviderError::rpc(
                "connection is unusable: an earlier request was interrupted while being sent",
            ));
        }
        let id = connection.next_id;
        connection.next_id += 1;

        let request = Request { id, method, params };
        let mut line = serde_json::to_string(&request).map_err(ProviderError::rpc)?;
        line.push('\n');

        let exchange = async {
            connection.writing = true;
            connection
                .writer
                .write_all(line.as_bytes())
                .await
                .map_err(ProviderError::rpc)?;
            connection.writer.flush().await.map_err(ProviderError::rpc)?;
            connection.writing = false;

            loop {
                // `read_until` keeps partial input in `pending` when cancelled.
                connection
                    .reader
                    .read_until(b'\n', &mut connection.pending)
                    .await
                    .map_err(ProviderError::rpc)?;
                if connection.pending.last() != Some(&b'\n') {
                    return Err(ProviderError::rpc("provider closed the connection"));
                }
                let received = std::mem::take(&mut connection.pending);
                let text = String::from_utf8_lossy(&received);
                if text.trim().is_empty() {
                    continue;
                }
                let response: Response = serde_json::from_str(text.trim_end())
                    .map_err(|e| ProviderError::rpc(format!("malformed response: {e}")))?;
                if response.id != id {
                    tracing::warn!(expected = id, got = response.id, "skipping stale response");
                    continue;
                }
                return response.into_result();
            }
        };

        cancel
            .run(exchange)
            .await
            .unwrap_or(Err(ProviderError::Cancelled))
    }
}

/// A provider process and its connection.
pub struct RemoteProcess {
    provider_type: String,
    binary: PathBuf,
    client: RpcClient,
    child: Mutex<Option<Child>>,
}

impl RemoteProcess {
    /// Wrap a spawned child whose stdin/stdout are piped.
    pub(crate) fn from_child(
        provider_type: &str,
        binary: &Path,
        mut child: Child,
    ) -> std::result::Result<Self, String> {
        let stdin = child.stdin.take().ok_or("child stdin is not piped")?;
        let stdout = child.stdout.take().ok_or("child stdout is not piped")?;
        Ok(Self {
            provider_type: provider_type.to_string(),
            binary: binary.to_path_buf(),
            client: RpcClient::new(stdout, stdin),
            child: Mutex::new(Some(child)),
        })
    }

    /// A process-less connection over arbitrary streams.
    pub fn from_streams(
        provider_type: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            provider_type: provider_type.into(),
            binary: PathBuf::new(),
            client: RpcClient::new(reader, writer),
            child: Mutex::new(None),
        }
    }

    pub fn provider_type(&self) -> &str {
        &self.provider_type
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub async fn call(
        &self,
        cancel: &Cancellation,
        method: Method,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.client.call(cancel, method, params).await
    }

    pub async fn health(&self, cancel: &Cancellation) -> Result<()> {
        self.call(cancel, Method::Health, json!({})).await.map(|_| ())
    }

    /// Ask the provider to exit, then make sure it has.
    ///
    /// Falls back to killing the process when it does not exit within the
    /// grace period.
    pub async fn shutdown(&self) -> std::result::Result<(), String> {
        let cancel = Cancellation::with_timeout(SHUTDOWN_GRACE);
        let acknowledged = self.call(&cancel, Method::Shutdown, json!({})).await;

        let mut slot = self.child.lock().await;
        let Some(mut child) = slot.take() else {
            return acknowledged.map(|_| ()).map_err(|e| e.to_string());
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                acknowledged.map(|_| ()).map_err(|e| e.to_string())
            }
            Ok(Ok(status)) => Err(format!("exited with {status}")),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => {
                child.kill().await.map_err(|e| e.to_string())?;
                Err(format!(
                    "did not exit within {}s and was killed",
                    SHUTDOWN_GRACE.as_secs()
                ))
            }
        }
    }
}

/// [`Provider`] backed by a [`RemoteProcess`].
pub struct RemoteProvider {
    process: Arc<RemoteProcess>,
    info: Option<ProviderInfo>,
}

impl RemoteProvider {
    pub fn new(process: Arc<RemoteProcess>) -> Self {
        Self {
            process,
            info: None,
        }
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    async fn init(&mut self, cancel: &Cancellation, options: InitOptions) -> Result<()> {
        let alias = options.alias.clone();
        let params = serde_json::to_value(&options).map_err(ProviderError::rpc)?;
        self.process
            .call(cancel, Method::Init, params)
            .await
            .map_err(|e| match e {
                ProviderError::Cancelled => e,
                other => ProviderError::init(&alias, other.to_string()),
            })?;

        self.info = match self.process.call(cancel, Method::Info, json!({})).await {
            Ok(info) => serde_json::from_value(info).unwrap_or_else(|e| {
                tracing::warn!(alias = %alias, error = %e, "ignoring malformed provider info");
                None
            }),
            Err(e) => {
                tracing::warn!(alias = %alias, error = %e, "provider info unavailable");
                None
            }
        };
        Ok(())
    }

    async fn fetch(&self, cancel: &Cancellation, path: &[String]) -> Result<Value> {
        let result = self
            .process
            .call(cancel, Method::Fetch, json!({ "path": path }))
            .await?;
        Ok(Value::from(result))
    }

    fn info(&self) -> Option<ProviderInfo> {
        self.info.clone()
    }
}
