/*
 * provider/remote/protocol.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Wire format for remote providers.
 */

//! Wire format for remote providers.
//!
//! Newline-delimited JSON over the provider process's stdin/stdout. Each
//! request gets exactly one response with the same `id`:
//!
//! ```json
//! {"id": 3, "method": "fetch", "params": {"path": ["base", "database", "host"]}}
//! {"id": 3, "result": "localhost"}
//! {"id": 4, "error": {"code": "not_found", "message": "`database.user` does not exist"}}
//! ```
//!
//! | method     | params                                   | result              |
//! |------------|------------------------------------------|---------------------|
//! | `init`     | `{alias, config, source_file_path?}`     | `null`              |
//! | `fetch`    | `{path: [segment, ...]}`                 | any JSON value      |
//! | `info`     | `{}`                                     | `{alias, version?}` or `null` |
//! | `health`   | `{}`                                     | `{status: "ok"}`    |
//! | `shutdown` | `{}`                                     | `null`              |

use serde::{Deserialize, Serialize};

use crate::provider::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Init,
    Fetch,
    Info,
    Health,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: Method,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    /// Absent on error. A `null` result deserializes to `None` as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// The result, with a missing result read as `null`.
    pub fn into_result(self) -> Result<serde_json::Value, ProviderError> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    InvalidRequest,
    NotInitialized,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub path: Vec<String>,
}

/// `not_found` stays distinguishable from transport failures.
impl From<RpcError> for ProviderError {
    fn from(error: RpcError) -> Self {
        match error.code {
            ErrorCode::NotFound => ProviderError::NotFound(error.message),
            ErrorCode::NotInitialized => {
                ProviderError::Rpc(format!("provider not initialized: {}", error.message))
            }
            ErrorCode::InvalidRequest => {
                ProviderError::Rpc(format!("invalid request: {}", error.message))
            }
            ErrorCode::Internal => ProviderError::Other(error.message),
        }
    }
}

impl From<&ProviderError> for RpcError {
    fn from(error: &ProviderError) -> Self {
        let code = match error {
            ProviderError::NotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        };
        RpcError::new(code, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = Request {
            id: 3,
            method: Method::Fetch,
            params: json!({"path": ["a", "b"]}),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"id":3,"method":"fetch","params":{"path":["a","b"]}}"#
        );
    }

    #[test]
    fn test_null_result_is_ok() {
        let response: Response = serde_json::from_str(r#"{"id":1,"result":null}"#).unwrap();
        assert_eq!(response.into_result(), Ok(serde_json::Value::Null));
    }

    #[test]
    fn test_error_codes_map_to_provider_errors() {
        let response: Response = serde_json::from_str(
            r#"{"id":1,"error":{"code":"not_found","message":"`x` does not exist"}}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_result(),
            Err(ProviderError::NotFound("`x` does not exist".into()))
        );

        let internal = ProviderError::from(RpcError::new(ErrorCode::Internal, "boom"));
        assert_eq!(internal, ProviderError::Other("boom".into()));
    }

    #[test]
    fn test_provider_error_to_wire() {
        let not_found = RpcError::from(&ProviderError::not_found(&["k".to_string()]));
        assert_eq!(not_found.code, ErrorCode::NotFound);
        assert_eq!(RpcError::from(&ProviderError::Cancelled).code, ErrorCode::Internal);
    }
}
