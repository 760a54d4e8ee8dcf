//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding reader frames and tag records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than the field or header being read.
    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    TruncatedFrame {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// Product code is zero or otherwise cannot encode an EPC length.
    #[error("invalid product code: 0x{0:04X}")]
    InvalidProductCode(u16),

    /// Destination byte matches neither RFID nor notification.
    #[error("unrecognized destination: 0x{0:02X}")]
    UnrecognizedDestination(u8),

    /// Payload is longer than the header's length indicator.
    #[error("length mismatch: header declares {declared} payload bytes, got {actual}")]
    LengthMismatch {
        /// Value of the length indicator.
        declared: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Reassembly buffer grew past its configured bound.
    #[error("buffer overflow: maximum {max} bytes, got {actual}")]
    BufferOverflow {
        /// Maximum allowed length.
        max: usize,
        /// Length that would have been reached.
        actual: usize,
    },

    /// Payload does not fit the one-byte length indicator.
    #[error("payload too long: {len} bytes, maximum {max}")]
    PayloadTooLong {
        /// Payload length.
        len: usize,
        /// Largest length the indicator can carry.
        max: usize,
    },
}

impl ProtocolError {
    /// Create a truncation error.
    pub fn truncated(expected: usize, actual: usize) -> Self {
        ProtocolError::TruncatedFrame { expected, actual }
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
