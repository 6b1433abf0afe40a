//! JSON-RPC 2.0 message types for the stdio bridge

use crate::state::{AgentState, ClientState};
use crate::sync::StateEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const SESSION_NOT_FOUND: i64 = -32001;
pub const TOOL_NOT_FOUND: i64 = -32002;

/// Incoming request. `id` is echoed back verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Outgoing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Server-initiated notification (no id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn state_snapshot(session_id: &str, event: &StateEvent) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: "state/snapshot".into(),
            params: serde_json::json!({
                "session_id": session_id,
                "event": event,
            }),
        }
    }
}

// ============================================================
// Method params
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStateParams {
    pub session_id: String,
    pub state: ClientState,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub session_id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResult {
    pub session_id: String,
    pub state: AgentState,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResult {
    pub closed: bool,
}
