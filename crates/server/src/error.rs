//! Structured errors for the worker server.
//!
//! Failures of the caching layer itself come through as [`larder_core::Error`];
//! these cover the host-facing surface.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the worker server.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Invalid tool parameters (e.g., a malformed header).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Click on a notification that was never shown or is already closed.
    #[error("UNKNOWN_NOTIFICATION: {0}")]
    UnknownNotification(u64),

    #[error(transparent)]
    Core(#[from] larder_core::Error),
}

impl From<WorkerError> for McpError {
    fn from(err: WorkerError) -> Self {
        let (code, message) = match err {
            WorkerError::InvalidInput(msg) => (-32602, msg),
            WorkerError::UnknownNotification(id) => (-32015, format!("unknown notification: {id}")),
            WorkerError::Core(e) => return e.into(),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
