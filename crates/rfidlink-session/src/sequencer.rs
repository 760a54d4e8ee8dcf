//! Initialization sequence driver.
//!
//! Sends the catalog's initialization commands one at a time. Each write must
//! be confirmed by the transport before the next is issued, so the reader
//! never sees two setup commands in flight.

use std::time::Duration;

use rfidlink_protocol::{initialization_sequence, Command};
use tracing::{debug, trace, warn};

use crate::error::{SessionError, SessionResult};
use crate::transport::Transport;

/// State of the initialization sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Nothing sent yet.
    Idle,
    /// Waiting on the transport for command `i`.
    Sending(usize),
    /// Every command was accepted.
    Done,
    /// Command `index` was refused; later commands were not sent.
    Failed {
        /// Zero-based position of the failed command.
        index: usize,
    },
}

/// Walks an ordered list of commands over a transport.
#[derive(Debug)]
pub struct InitSequencer {
    name: String,
    commands: Vec<Command>,
    state: SequencerState,
    command_delay: Duration,
    commands_sent: u32,
}

impl InitSequencer {
    /// Create a sequencer over the standard initialization sequence.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_commands(name, initialization_sequence().to_vec())
    }

    /// Create a sequencer over a custom command list.
    pub fn with_commands(name: impl Into<String>, commands: Vec<Command>) -> Self {
        InitSequencer {
            name: name.into(),
            commands,
            state: SequencerState::Idle,
            command_delay: Duration::ZERO,
            commands_sent: 0,
        }
    }

    /// Pause for `delay` between commands.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Commands in the sequence.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands accepted by the transport.
    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    /// Send every remaining command in order.
    ///
    /// Stops at the first transport error. Calling `run` again after a
    /// failure retries from the failed command.
    pub fn run<T: Transport + ?Sized>(&mut self, transport: &mut T) -> SessionResult<()> {
        let start = match self.state {
            SequencerState::Idle => 0,
            SequencerState::Sending(index) | SequencerState::Failed { index } => index,
            SequencerState::Done => return Ok(()),
        };

        debug!(
            "InitSequencer[{}]: Sending {} commands from step {}",
            self.name,
            self.commands.len(),
            start
        );

        for index in start..self.commands.len() {
            if index > start && !self.command_delay.is_zero() {
                std::thread::sleep(self.command_delay);
            }

            let command = self.commands[index];
            self.state = SequencerState::Sending(index);
            trace!(
                "InitSequencer[{}]: Sending command {}/{}: '{}'",
                self.name,
                index + 1,
                self.commands.len(),
                command
            );

            if let Err(source) = transport.send(&command.encode()) {
                warn!(
                    "InitSequencer[{}]: Command '{}' failed: {}",
                    self.name, command, source
                );
                self.state = SequencerState::Failed { index };
                return Err(SessionError::InitFailed {
                    index,
                    command,
                    source,
                });
            }
            self.commands_sent += 1;
        }

        debug!(
            "InitSequencer[{}]: All {} commands sent",
            self.name,
            self.commands.len()
        );
        self.state = SequencerState::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RecordingTransport, TransportError};

    #[test]
    fn test_sends_sequence_in_order() {
        let mut transport = RecordingTransport::new();
        let mut seq = InitSequencer::new("test");
        assert_eq!(seq.state(), SequencerState::Idle);

        seq.run(&mut transport).unwrap();

        assert_eq!(seq.state(), SequencerState::Done);
        assert_eq!(seq.commands_sent(), 10);
        let expected: Vec<Vec<u8>> = initialization_sequence()
            .iter()
            .map(|c| c.encode())
            .collect();
        assert_eq!(transport.sent(), expected.as_slice());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut transport = RecordingTransport::failing_at(3, TransportError::Timeout);
        let mut seq = InitSequencer::new("test");

        let err = seq.run(&mut transport).unwrap_err();
        match err {
            SessionError::InitFailed {
                index,
                command,
                source,
            } => {
                assert_eq!(index, 3);
                assert_eq!(command, Command::SelectProfile);
                assert_eq!(source, TransportError::Timeout);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(seq.state(), SequencerState::Failed { index: 3 });
        assert_eq!(transport.sent().len(), 3);
        assert_eq!(transport.attempts(), 4);
    }

    #[test]
    fn test_retry_resumes_at_failed_step() {
        let mut transport = RecordingTransport::failing_at(3, TransportError::Disconnected);
        let mut seq = InitSequencer::new("test");
        assert!(seq.run(&mut transport).is_err());

        seq.run(&mut transport).unwrap();
        assert_eq!(seq.state(), SequencerState::Done);
        assert_eq!(transport.sent().len(), 10);
        assert_eq!(transport.sent()[3], Command::SelectProfile.encode());
    }

    #[test]
    fn test_done_is_idempotent() {
        let mut transport = RecordingTransport::new();
        let mut seq = InitSequencer::with_commands("test", vec![Command::PowerOnModule]);
        seq.run(&mut transport).unwrap();
        seq.run(&mut transport).unwrap();
        assert_eq!(transport.sent().len(), 1);
    }
}
