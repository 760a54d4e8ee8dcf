//! Tag-read batch reassembly.
//!
//! The reader's tag-read responses are larger than the transport MTU, so a
//! batch arrives as one tag-read frame followed by any number of headerless
//! continuation chunks. The batch ends when the next recognized frame header
//! arrives; there is no length or terminator to rely on.

use bytes::BytesMut;
use rfidlink_protocol::{decode_batch, ProtocolError, TagBatch};

use crate::config::ContinuationPolicy;

/// Buffer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyState {
    /// Nothing buffered.
    Idle,
    /// A batch is open.
    Accumulating,
}

/// Result of closing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch decoded. May hold zero records.
    Extracted(TagBatch),
    /// The batch was malformed and has been dropped.
    Discarded(ProtocolError),
}

/// Accumulates one batch at a time.
#[derive(Debug)]
pub struct StreamReassembler {
    buffer: BytesMut,
    max_len: usize,
    policy: ContinuationPolicy,
    /// Length the buffer would have reached when it overflowed.
    overflow: Option<usize>,
    /// Continuations belong to a rejected frame until the next boundary.
    skipping: bool,
}

impl StreamReassembler {
    /// Create a reassembler bounded to `max_len` bytes.
    pub fn new(max_len: usize, policy: ContinuationPolicy) -> Self {
        StreamReassembler {
            buffer: BytesMut::with_capacity(max_len.min(4096)),
            max_len,
            policy,
            overflow: None,
            skipping: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> ReassemblyState {
        if self.buffer.is_empty() && self.overflow.is_none() {
            ReassemblyState::Idle
        } else {
            ReassemblyState::Accumulating
        }
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered bytes, for inspection.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Open a batch with a tag-read frame.
    ///
    /// If a batch is already open the frame is appended to it; callers flush
    /// first when they want a fresh batch.
    pub fn begin_batch(&mut self, frame: &[u8]) {
        self.skipping = false;
        self.append(frame);
    }

    /// Add a chunk that matched no frame header.
    ///
    /// Returns `false` if the chunk was dropped, either by the policy or
    /// because it follows a rejected frame.
    pub fn push_continuation(&mut self, chunk: &[u8]) -> bool {
        if self.skipping {
            return false;
        }
        if self.policy == ContinuationPolicy::DropWhenIdle
            && self.state() == ReassemblyState::Idle
        {
            return false;
        }
        self.append(chunk);
        true
    }

    /// Drop continuation chunks until the next flush.
    ///
    /// Used when a frame header was recognized but rejected, so the chunks
    /// that follow it have no batch to belong to.
    pub fn skip_continuations(&mut self) {
        self.skipping = true;
    }

    fn append(&mut self, data: &[u8]) {
        if let Some(reached) = self.overflow.as_mut() {
            *reached += data.len();
            return;
        }

        let next_len = self.buffer.len() + data.len();
        if next_len > self.max_len {
            self.buffer.clear();
            self.overflow = Some(next_len);
            return;
        }

        self.buffer.extend_from_slice(data);
    }

    /// Close the open batch, decode it and clear the buffer.
    ///
    /// Returns `None` if nothing was buffered. The buffer is empty afterwards
    /// whatever the outcome.
    pub fn flush(&mut self) -> Option<BatchOutcome> {
        self.skipping = false;
        if let Some(actual) = self.overflow.take() {
            self.buffer.clear();
            return Some(BatchOutcome::Discarded(ProtocolError::BufferOverflow {
                max: self.max_len,
                actual,
            }));
        }

        if self.buffer.is_empty() {
            return None;
        }

        let outcome = match decode_batch(&self.buffer) {
            Ok(batch) => BatchOutcome::Extracted(batch),
            Err(e) => BatchOutcome::Discarded(e),
        };
        self.buffer.clear();
        Some(outcome)
    }

    /// Drop any buffered bytes without decoding them.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflow = None;
        self.skipping = false;
    }
}

impl Default for StreamReassembler {
    fn default() -> Self {
        StreamReassembler::new(4096, ContinuationPolicy::Append)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "A7B327C2829E000081000400058026000000";
    const RECORD: &str = "4000018208A1CD5D948B3203007101000000C5";

    fn bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_idle_flush_is_none() {
        let mut r = StreamReassembler::default();
        assert_eq!(r.state(), ReassemblyState::Idle);
        assert!(r.flush().is_none());
    }

    #[test]
    fn test_split_batch() {
        let mut full = bytes(HEADER);
        full.extend(bytes(RECORD));

        let mut r = StreamReassembler::default();
        r.begin_batch(&full[..20]);
        assert_eq!(r.state(), ReassemblyState::Accumulating);
        assert!(r.push_continuation(&full[20..30]));
        assert!(r.push_continuation(&full[30..]));
        assert_eq!(r.buffered_len(), full.len());

        match r.flush() {
            Some(BatchOutcome::Extracted(batch)) => {
                assert_eq!(batch.records.len(), 1);
                assert_eq!(batch.records[0].visual_id, Some(900_000_001_150_369));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(r.state(), ReassemblyState::Idle);
    }

    #[test]
    fn test_failure_clears_buffer() {
        let mut data = bytes(HEADER);
        data.extend([0x00, 0x00, 0x01]);

        let mut r = StreamReassembler::default();
        r.begin_batch(&data);
        assert_eq!(
            r.flush(),
            Some(BatchOutcome::Discarded(ProtocolError::InvalidProductCode(0)))
        );
        assert_eq!(r.buffered_len(), 0);
        assert_eq!(r.state(), ReassemblyState::Idle);
    }

    #[test]
    fn test_orphan_chunk_policy() {
        let mut append = StreamReassembler::new(64, ContinuationPolicy::Append);
        assert!(append.push_continuation(&[1, 2, 3]));
        assert_eq!(append.buffered_len(), 3);

        let mut drop = StreamReassembler::new(64, ContinuationPolicy::DropWhenIdle);
        assert!(!drop.push_continuation(&[1, 2, 3]));
        assert_eq!(drop.state(), ReassemblyState::Idle);

        drop.begin_batch(&bytes(HEADER));
        assert!(drop.push_continuation(&[1, 2, 3]));
    }

    #[test]
    fn test_overflow_discards_batch() {
        let mut r = StreamReassembler::new(20, ContinuationPolicy::Append);
        r.begin_batch(&bytes(HEADER));
        r.push_continuation(&[0u8; 5]);
        r.push_continuation(&[0u8; 5]);
        assert_eq!(r.buffered_len(), 0);
        assert_eq!(r.state(), ReassemblyState::Accumulating);

        assert_eq!(
            r.flush(),
            Some(BatchOutcome::Discarded(ProtocolError::BufferOverflow {
                max: 20,
                actual: 28
            }))
        );
        assert_eq!(r.state(), ReassemblyState::Idle);
        assert!(r.flush().is_none());
    }

    #[test]
    fn test_skip_continuations_until_flush() {
        let mut r = StreamReassembler::new(64, ContinuationPolicy::Append);
        r.skip_continuations();
        assert!(!r.push_continuation(&[1, 2, 3]));
        assert!(!r.push_continuation(&[4, 5]));
        assert_eq!(r.state(), ReassemblyState::Idle);

        assert!(r.flush().is_none());
        assert!(r.push_continuation(&[1, 2, 3]));
        assert_eq!(r.buffered_len(), 3);
    }
}
