//! Error types

use thiserror::Error;

/// Failure of a single tool call.
///
/// Reported back to the caller as a failed `ToolOutput`; never fatal to
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Session lookup and dispatch errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Transport errors for the stdio bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}
