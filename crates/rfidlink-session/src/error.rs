//! Error types for reader sessions.

use rfidlink_protocol::{Command, ProtocolError};
use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while driving a reader session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Frame or record could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport refused a frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A command of the initialization sequence could not be sent.
    #[error("initialization failed at step {index} ({command}): {source}")]
    InitFailed {
        /// Zero-based position in the sequence.
        index: usize,
        /// The command that failed.
        command: Command,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// Configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
