//! Outbound transport seam.
//!
//! The session never owns a connection. It hands complete frames to a
//! [`Transport`] one at a time and waits for each call to return before
//! issuing the next.

use thiserror::Error;

/// Acknowledgment that a frame was accepted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// Errors reported by a transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link is down.
    #[error("transport disconnected")]
    Disconnected,

    /// The write was not confirmed in time.
    #[error("timeout waiting for write confirmation")]
    Timeout,

    /// Any other I/O failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// A byte-out channel to the reader.
pub trait Transport {
    /// Write one complete frame. Returns once the write is confirmed.
    fn send(&mut self, frame: &[u8]) -> Result<Ack, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<Ack, TransportError> {
        (**self).send(frame)
    }
}

/// In-memory transport that records every frame it is given.
///
/// Can be told to fail on a given send, which makes it useful for dry runs
/// and for exercising failure paths.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<Vec<u8>>,
    fail_at: Option<(usize, TransportError)>,
    attempts: usize,
}

impl RecordingTransport {
    /// Create a transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose `index`-th send (zero-based) fails with `error`.
    pub fn failing_at(index: usize, error: TransportError) -> Self {
        RecordingTransport {
            fail_at: Some((index, error)),
            ..Self::default()
        }
    }

    /// Frames accepted so far, in order.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Number of send attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Forget recorded frames.
    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, frame: &[u8]) -> Result<Ack, TransportError> {
        let attempt = self.attempts;
        self.attempts += 1;

        if let Some((index, error)) = &self.fail_at {
            if *index == attempt {
                return Err(error.clone());
            }
        }

        self.sent.push(frame.to_vec());
        Ok(Ack {
            bytes_written: frame.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_transport() {
        let mut transport = RecordingTransport::new();
        let ack = transport.send(&[1, 2, 3]).unwrap();
        assert_eq!(ack.bytes_written, 3);
        transport.send(&[4]).unwrap();

        assert_eq!(transport.sent(), &[vec![1, 2, 3], vec![4]]);
        assert_eq!(transport.attempts(), 2);
    }

    #[test]
    fn test_failing_transport() {
        let mut transport = RecordingTransport::failing_at(1, TransportError::Timeout);
        assert!(transport.send(&[1]).is_ok());
        assert_eq!(transport.send(&[2]), Err(TransportError::Timeout));
        assert!(transport.send(&[3]).is_ok());

        assert_eq!(transport.sent(), &[vec![1], vec![3]]);
        assert_eq!(transport.attempts(), 3);
    }
}
