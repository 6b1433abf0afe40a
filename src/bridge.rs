//! Stdio bridge for an external agent runtime
//!
//! Newline-delimited JSON-RPC 2.0. Requests are handled concurrently; tool
//! calls on the same session still run one at a time because the session
//! lock serializes them. Every snapshot a session broadcasts is forwarded
//! as a `state/snapshot` notification.

pub mod protocol;

use crate::error::{BridgeError, SessionError};
use crate::session::SessionManager;
use crate::sync::StateEvent;
use futures::stream::{BoxStream, StreamExt};
use protocol::{
    CallToolParams, CloseSessionResult, CreateSessionResult, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, SessionParams, SetStateParams, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, SESSION_NOT_FOUND, TOOL_NOT_FOUND,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

const INTERNAL_ERROR: i64 = -32603;

type Outbox = mpsc::UnboundedSender<String>;

impl From<SessionError> for JsonRpcError {
    fn from(err: SessionError) -> Self {
        let code = match err {
            SessionError::NotFound(_) => SESSION_NOT_FOUND,
            SessionError::UnknownTool(_) => TOOL_NOT_FOUND,
        };
        JsonRpcError {
            code,
            message: err.to_string(),
        }
    }
}

/// Serve requests from `reader` until end of input.
///
/// In-flight requests are drained and all sessions closed before
/// returning. Returns the writer once everything has been flushed.
pub async fn serve<R, W>(
    manager: Arc<SessionManager>,
    reader: R,
    writer: W,
) -> Result<W, BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_lines(writer, out_rx));
    let mut inflight = JoinSet::new();

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match parse_request(line) {
            Ok(request) => request,
            Err(response) => {
                tracing::warn!(error = ?response.error, "Rejected malformed request");
                send(&out_tx, &response);
                continue;
            }
        };

        let manager = manager.clone();
        let out_tx = out_tx.clone();
        inflight.spawn(async move {
            let id = request.id.clone();
            let method = request.method.clone();
            let result = dispatch(&manager, &out_tx, request).await;
            // Notifications get no reply
            if id.is_null() {
                if let Err(err) = result {
                    tracing::debug!(method = %method, error = %err.message, "Notification failed");
                }
                return;
            }
            let response = match result {
                Ok(result) => JsonRpcResponse::result(id, result),
                Err(err) => JsonRpcResponse {
                    jsonrpc: "2.0".into(),
                    id,
                    result: None,
                    error: Some(err),
                },
            };
            send(&out_tx, &response);
        });
    }

    while let Some(joined) = inflight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Request task failed");
        }
    }

    manager.close_all().await;
    drop(out_tx);

    let writer = writer_task.await??;
    tracing::info!("Bridge input closed");
    Ok(writer)
}

fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| JsonRpcResponse::error(Value::Null, PARSE_ERROR, e.to_string()))?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(id, INVALID_REQUEST, e.to_string()))
}

async fn dispatch(
    manager: &SessionManager,
    out_tx: &Outbox,
    request: JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    tracing::debug!(method = %request.method, "Handling request");

    match request.method.as_str() {
        "session/create" => {
            let session = manager.create().await;
            forward_snapshots(session.id().to_string(), session.subscribe().await, out_tx);
            to_result(&CreateSessionResult {
                session_id: session.id().to_string(),
                state: session.state().await,
            })
        }
        "session/close" => {
            let params: SessionParams = params(request.params)?;
            to_result(&CloseSessionResult {
                closed: manager.close(&params.session_id).await,
            })
        }
        "state/get" => {
            let params: SessionParams = params(request.params)?;
            let session = manager.get(&params.session_id).await?;
            to_result(&session.state().await)
        }
        "state/set" => {
            let params: SetStateParams = params(request.params)?;
            let event = manager
                .apply_client_state(&params.session_id, params.state)
                .await?;
            to_result(&event)
        }
        "tools/list" => to_result(&manager.definitions()),
        "tools/call" => {
            let params: CallToolParams = params(request.params)?;
            let output = manager
                .invoke(&params.session_id, &params.name, params.arguments)
                .await?;
            to_result(&output)
        }
        other => Err(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Unknown method: {other}"),
        }),
    }
}

/// Forward a session's events as notifications until the session ends
fn forward_snapshots(
    session_id: String,
    mut events: BoxStream<'static, StateEvent>,
    out_tx: &Outbox,
) {
    let out_tx = out_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            send(&out_tx, &JsonRpcNotification::state_snapshot(&session_id, &event));
        }
        tracing::debug!(session_id = %session_id, "Snapshot forwarding stopped");
    });
}

fn params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| JsonRpcError {
        code: INVALID_PARAMS,
        message: format!("Invalid params: {e}"),
    })
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError {
        code: INTERNAL_ERROR,
        message: e.to_string(),
    })
}

fn send<T: Serialize>(out_tx: &Outbox, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            // Receiver only goes away once serving is over
            let _ = out_tx.send(line);
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize outgoing message"),
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}
