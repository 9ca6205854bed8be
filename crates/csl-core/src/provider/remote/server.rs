/*
 * provider/remote/server.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Hosting a provider behind the remote protocol.
 */

//! Hosting a provider behind the remote protocol.

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::{ErrorCode, FetchParams, Method, Request, Response, RpcError};
use crate::cancellation::Cancellation;
use crate::provider::error::{ProviderError, Result};
use crate::provider::traits::{InitOptions, Provider};

/// Serve `provider` over newline-delimited JSON until `shutdown` or EOF.
///
/// Used by provider executables:
///
/// ```ignore
/// serve(FileProvider::new(), tokio::io::stdin(), tokio::io::stdout()).await?;
/// ```
pub async fn serve<P, R, W>(mut provider: P, reader: R, mut writer: W) -> Result<()>
where
    P: Provider,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let cancel = Cancellation::new();
    let mut lines = BufReader::new(reader).lines();
    let mut initialized = false;

    while let Some(line) = lines.next_line().await.map_err(ProviderError::rpc)? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let response = Response::err(
                    0,
                    RpcError::new(ErrorCode::InvalidRequest, format!("malformed request: {e}")),
                );
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        tracing::debug!(id = request.id, method = ?request.method, "provider request");
        let id = request.id;
        let outcome = match request.method {
            Method::Init => match serde_json::from_value::<InitOptions>(request.params) {
                Ok(options) => match provider.init(&cancel, options).await {
                    Ok(()) => {
                        initialized = true;
                        Ok(serde_json::Value::Null)
                    }
                    Err(e) => Err(RpcError::from(&e)),
                },
                Err(e) => Err(RpcError::new(ErrorCode::InvalidRequest, e.to_string())),
            },
            Method::Fetch if !initialized => Err(RpcError::new(
                ErrorCode::NotInitialized,
                "`init` must be called before `fetch`",
            )),
            Method::Fetch => match serde_json::from_value::<FetchParams>(request.params) {
                Ok(params) => provider
                    .fetch(&cancel, &params.path)
                    .await
                    .map(|value| value.to_json())
                    .map_err(|e| RpcError::from(&e)),
                Err(e) => Err(RpcError::new(ErrorCode::InvalidRequest, e.to_string())),
            },
            Method::Info => serde_json::to_value(provider.info())
                .map_err(|e| RpcError::new(ErrorCode::Internal, e.to_string())),
            Method::Health => Ok(json!({ "status": "ok" })),
            Method::Shutdown => {
                write_response(&mut writer, &Response::ok(id, serde_json::Value::Null)).await?;
                return Ok(());
            }
        };

        let response = match outcome {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::err(id, error),
        };
        write_response(&mut writer, &response).await?;
    }
    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    let mut line = serde_json::to_string(response).map_err(ProviderError::rpc)?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(ProviderError::rpc)?;
    writer.flush().await.map_err(ProviderError::rpc)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::provider::MemoryProvider;
    use crate::provider::remote::{RemoteProcess, RemoteProvider};
    use csl_config::Value;

    /// A remote provider talking to `serve` over in-memory pipes.
    fn connect(provider: MemoryProvider) -> (Arc<RemoteProcess>, tokio::task::JoinHandle<Result<()>>) {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_side);
        let server = tokio::spawn(serve(provider, server_read, server_write));
        let (client_read, client_write) = tokio::io::split(client_side);
        (
            Arc::new(RemoteProcess::from_streams("memory", client_read, client_write)),
            server,
        )
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_round_trip_through_remote_provider() {
        let (process, server) = connect(
            MemoryProvider::from_json(json!({"db": {"host": "localhost", "port": 5432, "tls": true}}))
                .with_version("2.0.0"),
        );
        let cancel = Cancellation::new();
        process.health(&cancel).await.unwrap();

        let mut remote = RemoteProvider::new(process.clone());
        remote.init(&cancel, InitOptions::new("db")).await.unwrap();
        assert_eq!(remote.info().unwrap().version.as_deref(), Some("2.0.0"));

        let db = remote.fetch(&cancel, &path(&["db"])).await.unwrap();
        assert_eq!(db.to_json(), json!({"host": "localhost", "port": 5432, "tls": true}));

        let err = remote.fetch(&cancel, &path(&["db", "user"])).await.unwrap_err();
        assert!(err.is_not_found(), "{err:?}");

        process.shutdown().await.unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_before_init_is_rejected() {
        let (process, _server) = connect(MemoryProvider::new(Value::Null));
        let err = process
            .call(&Cancellation::new(), Method::Fetch, json!({"path": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rpc(ref m) if m.contains("not initialized")));
    }

    #[tokio::test]
    async fn test_null_values_survive_the_wire() {
        let (process, _server) = connect(MemoryProvider::from_json(json!({"empty": null})));
        let cancel = Cancellation::new();
        let mut remote = RemoteProvider::new(process);
        remote.init(&cancel, InitOptions::new("m")).await.unwrap();
        assert_eq!(remote.fetch(&cancel, &path(&["empty"])).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error_response() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        tokio::spawn(serve(MemoryProvider::default(), server_read, server_write));

        let (client_read, mut client_write) = tokio::io::split(client_side);
        client_write.write_all(b"not json\n").await.unwrap();
        let mut lines = BufReader::new(client_read).lines();
        let response: Response =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(response.id, 0);
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidRequest);
    }
}
