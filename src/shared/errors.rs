//! Strict error handling with EngineError enum
//!
//! Replaces ad-hoc `Result<T, String>` with proper error types using thiserror.
//! All errors are serializable so a surrounding application can forward them
//! to its own surface unchanged.

use serde::Serialize;
use thiserror::Error;

/// Engine operation errors
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum EngineError {
    /// System I/O error (file operations, directories, etc.)
    #[error("System I/O error: {0}")]
    SystemIO(String),

    /// Clipboard read/write error
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// History persistence error (load/save)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The monitor is already running; stop it before starting again
    #[error("Clipboard monitor is already running")]
    AlreadyRunning,
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::SystemIO(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Persistence(format!("JSON error: {}", err))
    }
}

// Helper type alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;
