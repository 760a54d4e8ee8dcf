//! Reader session: classifies inbound deliveries, reassembles tag-read
//! batches and answers trigger notifications with inventory commands.
//!
//! Deliveries are processed one at a time and to completion. Any recognized
//! frame header closes the open batch before the frame itself is handled, so a
//! trigger press that arrives mid-batch still sees the batch flushed first.

use std::time::Duration;

use rfidlink_protocol::{
    classify_frame, Command, Frame, FrameClass, NotificationEvent, ProtocolError, RfidEvent,
    TagRecord,
};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::reassembler::{BatchOutcome, ReassemblyState, StreamReassembler};
use crate::sequencer::{InitSequencer, SequencerState};
use crate::telemetry::metric_defs;
use crate::transport::{Ack, Transport, TransportError};

// ============================================================================
// Events
// ============================================================================

/// Something the application may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A batch closed and decoded. Empty when no tags were seen.
    BatchExtracted(Vec<TagRecord>),
    /// A batch closed but was malformed and has been dropped.
    BatchDiscarded(ProtocolError),
    /// A command was accepted by the transport.
    CommandSent(Command),
    /// A command could not be sent.
    CommandFailed {
        /// The command.
        command: Command,
        /// Why the transport refused it.
        error: TransportError,
    },
    /// The reader acknowledged a command.
    CommandAcknowledged,
    /// The RFID module reported power-on.
    ModulePoweredOn,
    /// Battery voltage report.
    Battery {
        /// Battery voltage in millivolts.
        millivolts: u16,
    },
    /// A frame failed length validation and was ignored.
    FrameRejected(ProtocolError),
    /// An orphan continuation chunk was dropped.
    ContinuationDropped {
        /// Chunk length.
        len: usize,
    },
}

/// Running counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Inbound deliveries processed.
    pub frames_received: u64,
    /// Commands accepted by the transport.
    pub commands_sent: u64,
    /// Commands the transport refused.
    pub commands_failed: u64,
    /// Command acknowledgments received.
    pub acks_received: u64,
    /// Batches decoded.
    pub batches_extracted: u64,
    /// Batches dropped.
    pub batches_discarded: u64,
    /// Tag records reported.
    pub tags_read: u64,
}

// ============================================================================
// Session
// ============================================================================

/// One reader session. Owns its reassembly buffer.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    reassembler: StreamReassembler,
    sequencer: InitSequencer,
    stats: SessionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Create a session.
    pub fn new(config: SessionConfig) -> Self {
        let reassembler = StreamReassembler::new(config.max_buffer_len, config.continuation);
        let sequencer = InitSequencer::new(config.name.clone())
            .with_delay(Duration::from_millis(config.command_delay_ms));
        Session {
            config,
            reassembler,
            sequencer,
            stats: SessionStats::default(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Reassembly state.
    pub fn reassembly_state(&self) -> ReassemblyState {
        self.reassembler.state()
    }

    /// Number of bytes waiting in the reassembly buffer.
    pub fn buffered_len(&self) -> usize {
        self.reassembler.buffered_len()
    }

    /// State of the initialization sequence.
    pub fn init_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    /// Send the initialization sequence, one confirmed write at a time.
    ///
    /// After a failure, calling this again resumes at the command that
    /// failed. Once the sequence is done, further calls send nothing.
    pub fn initialize<T: Transport + ?Sized>(&mut self, transport: &mut T) -> SessionResult<()> {
        let before = self.sequencer.commands_sent();
        let result = self.sequencer.run(transport);

        let sent = u64::from(self.sequencer.commands_sent() - before);
        self.stats.commands_sent += sent;
        metric_defs::COMMANDS_SENT.increment(&self.config.name, sent);
        if result.is_err() {
            self.stats.commands_failed += 1;
        }
        result
    }

    /// Send the start-inventory command.
    pub fn start_inventory<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> SessionResult<Ack> {
        self.send_command(Command::StartInventory, transport)
    }

    /// Send the abort-inventory command.
    pub fn abort_inventory<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> SessionResult<Ack> {
        self.send_command(Command::AbortInventory, transport)
    }

    /// Ask the reader for its battery voltage. The answer arrives as a
    /// [`SessionEvent::Battery`].
    pub fn query_battery<T: Transport + ?Sized>(&mut self, transport: &mut T) -> SessionResult<Ack> {
        self.send_command(Command::QueryBattery, transport)
    }

    fn send_command<T: Transport + ?Sized>(
        &mut self,
        command: Command,
        transport: &mut T,
    ) -> SessionResult<Ack> {
        Ok(self.try_send(command, transport)?)
    }

    fn try_send<T: Transport + ?Sized>(
        &mut self,
        command: Command,
        transport: &mut T,
    ) -> Result<Ack, TransportError> {
        trace!("Session[{}]: Sending '{}'", self.config.name, command);
        match transport.send(&command.encode()) {
            Ok(ack) => {
                self.stats.commands_sent += 1;
                metric_defs::COMMANDS_SENT.increment(&self.config.name, 1);
                Ok(ack)
            }
            Err(e) => {
                warn!(
                    "Session[{}]: Command '{}' failed: {}",
                    self.config.name, command, e
                );
                self.stats.commands_failed += 1;
                Err(e)
            }
        }
    }

    /// Process one inbound transport delivery.
    ///
    /// Commands triggered by the delivery are sent on `transport` before this
    /// returns.
    pub fn handle_frame<T: Transport + ?Sized>(
        &mut self,
        data: &[u8],
        transport: &mut T,
    ) -> Vec<SessionEvent> {
        self.stats.frames_received += 1;
        metric_defs::FRAMES_RECEIVED.increment(&self.config.name, 1);

        let mut events = Vec::new();
        let frame = Frame::decode(data).ok();
        let class = frame
            .as_ref()
            .map(classify_frame)
            .unwrap_or(FrameClass::Unclassified);

        if class.is_boundary() && self.config.validate_length {
            if let Some(Err(e)) = frame.as_ref().map(Frame::validate_length) {
                warn!("Session[{}]: Rejecting frame: {}", self.config.name, e);
                self.flush_into(&mut events);
                self.reassembler.skip_continuations();
                events.push(SessionEvent::FrameRejected(e));
                return events;
            }
        }

        match class {
            FrameClass::Unclassified => {
                if self.reassembler.push_continuation(data) {
                    trace!(
                        "Session[{}]: Continuation chunk ({} bytes, {} buffered)",
                        self.config.name,
                        data.len(),
                        self.reassembler.buffered_len()
                    );
                } else {
                    trace!(
                        "Session[{}]: Dropping orphan chunk ({} bytes)",
                        self.config.name,
                        data.len()
                    );
                    events.push(SessionEvent::ContinuationDropped { len: data.len() });
                }
            }
            FrameClass::Notification(event) => {
                self.flush_into(&mut events);
                self.handle_notification(event, transport, &mut events);
            }
            FrameClass::Rfid(event) => {
                self.flush_into(&mut events);
                self.handle_rfid(event, data, &mut events);
            }
            FrameClass::HeaderOnly(destination) => {
                self.flush_into(&mut events);
                trace!(
                    "Session[{}]: Header-only frame for {:?}",
                    self.config.name,
                    destination
                );
            }
        }

        events
    }

    fn handle_notification<T: Transport + ?Sized>(
        &mut self,
        event: NotificationEvent,
        transport: &mut T,
        events: &mut Vec<SessionEvent>,
    ) {
        let command = match event {
            NotificationEvent::TriggerPushed => Command::StartInventory,
            NotificationEvent::TriggerReleased => Command::AbortInventory,
            NotificationEvent::Battery { millivolts } => {
                debug!("Session[{}]: Battery {} mV", self.config.name, millivolts);
                events.push(SessionEvent::Battery { millivolts });
                return;
            }
            NotificationEvent::Other(code) => {
                trace!(
                    "Session[{}]: Ignoring notification 0x{:04X}",
                    self.config.name,
                    code
                );
                return;
            }
        };

        debug!("Session[{}]: {:?} -> '{}'", self.config.name, event, command);
        match self.try_send(command, transport) {
            Ok(_) => events.push(SessionEvent::CommandSent(command)),
            Err(error) => events.push(SessionEvent::CommandFailed { command, error }),
        }
    }

    fn handle_rfid(&mut self, event: RfidEvent, data: &[u8], events: &mut Vec<SessionEvent>) {
        match event {
            RfidEvent::TagRead => {
                trace!(
                    "Session[{}]: Tag-read frame ({} bytes)",
                    self.config.name,
                    data.len()
                );
                self.reassembler.begin_batch(data);
            }
            RfidEvent::CommandAck => {
                trace!("Session[{}]: Command acknowledged", self.config.name);
                self.stats.acks_received += 1;
                events.push(SessionEvent::CommandAcknowledged);
            }
            RfidEvent::PowerOn => {
                debug!("Session[{}]: RFID module powered on", self.config.name);
                events.push(SessionEvent::ModulePoweredOn);
            }
            RfidEvent::Other(code) => {
                trace!(
                    "Session[{}]: Ignoring RFID event 0x{:04X}",
                    self.config.name,
                    code
                );
            }
        }
    }

    /// Close any open batch, e.g. at end of stream.
    pub fn finish(&mut self) -> Option<SessionEvent> {
        let mut events = Vec::new();
        self.flush_into(&mut events);
        events.pop()
    }

    /// Drop the open batch without decoding it.
    pub fn reset(&mut self) {
        self.reassembler.clear();
    }

    fn flush_into(&mut self, events: &mut Vec<SessionEvent>) {
        match self.reassembler.flush() {
            None => {}
            Some(BatchOutcome::Extracted(batch)) => {
                let count = batch.records.len() as u64;
                debug!(
                    "Session[{}]: Batch extracted ({} tags)",
                    self.config.name, count
                );
                for record in &batch.records {
                    trace!(
                        "Session[{}]: Tag {} rssi={} visual_id={:?}",
                        self.config.name,
                        record.epc_hex(),
                        record.rssi,
                        record.visual_id
                    );
                }
                self.stats.batches_extracted += 1;
                self.stats.tags_read += count;
                metric_defs::BATCHES_EXTRACTED.increment(&self.config.name, 1);
                metric_defs::TAGS_READ.increment(&self.config.name, count);
                events.push(SessionEvent::BatchExtracted(batch.records));
            }
            Some(BatchOutcome::Discarded(e)) => {
                warn!("Session[{}]: Batch discarded: {}", self.config.name, e);
                self.stats.batches_discarded += 1;
                metric_defs::BATCHES_DISCARDED.increment(&self.config.name, 1);
                events.push(SessionEvent::BatchDiscarded(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    fn notification(code: u16) -> Vec<u8> {
        let mut buf = vec![0xA7, 0xB3, 0x02, 0xD9, 0x82, 0x9E, 0x00, 0x00];
        buf.extend_from_slice(&code.to_be_bytes());
        buf
    }

    #[test]
    fn test_trigger_pushed_sends_start() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::new();

        let events = session.handle_frame(&notification(0xA102), &mut transport);

        assert_eq!(events, vec![SessionEvent::CommandSent(Command::StartInventory)]);
        assert_eq!(transport.sent(), &[Command::StartInventory.encode()]);
        assert_eq!(session.stats().commands_sent, 1);
    }

    #[test]
    fn test_trigger_released_sends_abort() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::new();

        let events = session.handle_frame(&notification(0xA103), &mut transport);

        assert_eq!(events, vec![SessionEvent::CommandSent(Command::AbortInventory)]);
        assert_eq!(transport.sent(), &[Command::AbortInventory.encode()]);
    }

    #[test]
    fn test_send_failure_is_reported() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::failing_at(0, TransportError::Disconnected);

        let events = session.handle_frame(&notification(0xA102), &mut transport);

        assert_eq!(
            events,
            vec![SessionEvent::CommandFailed {
                command: Command::StartInventory,
                error: TransportError::Disconnected,
            }]
        );
        assert_eq!(session.stats().commands_failed, 1);
    }

    #[test]
    fn test_unknown_notification_ignored() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::new();

        let events = session.handle_frame(&notification(0xA001), &mut transport);

        assert!(events.is_empty());
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_initialize_counts_commands() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::new();

        session.initialize(&mut transport).unwrap();

        assert_eq!(transport.sent().len(), 10);
        assert_eq!(session.stats().commands_sent, 10);
    }

    #[test]
    fn test_finish_without_batch() {
        let mut session = Session::default();
        assert!(session.finish().is_none());
    }

    #[test]
    fn test_reset_drops_open_batch() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::new();
        let header = hex::decode("A7B34CC2829E000081000400058040000000").unwrap();

        assert!(session.handle_frame(&header, &mut transport).is_empty());
        assert_eq!(session.buffered_len(), header.len());

        session.reset();
        assert_eq!(session.buffered_len(), 0);
        assert_eq!(session.reassembly_state(), ReassemblyState::Idle);
        assert!(session.finish().is_none());
        assert_eq!(session.stats().batches_discarded, 0);
    }

    #[test]
    fn test_initialize_resumes_after_failure() {
        let mut session = Session::default();
        let mut transport = RecordingTransport::failing_at(3, TransportError::Timeout);

        assert!(session.initialize(&mut transport).is_err());
        assert_eq!(session.init_state(), SequencerState::Failed { index: 3 });
        assert_eq!(session.stats().commands_sent, 3);

        session.initialize(&mut transport).unwrap();
        assert_eq!(session.init_state(), SequencerState::Done);
        assert_eq!(session.stats().commands_sent, 10);
        assert_eq!(session.stats().commands_failed, 1);
    }
}
