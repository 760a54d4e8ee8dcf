//! Reader sessions for handheld UHF RFID readers.
//!
//! This crate drives a reader over any byte-out [`Transport`]:
//!
//! 1. [`InitSequencer`] sends the setup commands, one confirmed write at a time
//! 2. [`Session::handle_frame`] classifies each inbound delivery, answers
//!    trigger notifications with inventory commands, and feeds tag-read data
//!    into a [`StreamReassembler`]
//! 3. Closed batches come back as [`SessionEvent::BatchExtracted`] or, when
//!    malformed, [`SessionEvent::BatchDiscarded`]
//!
//! # Example
//!
//! ```rust,ignore
//! use rfidlink_session::{Session, SessionConfig, SessionEvent};
//!
//! let mut session = Session::new(SessionConfig::from_file("reader.yaml")?);
//! session.initialize(&mut transport)?;
//!
//! for delivery in notifications {
//!     for event in session.handle_frame(&delivery, &mut transport) {
//!         if let SessionEvent::BatchExtracted(tags) = event {
//!             // ...
//!         }
//!     }
//! }
//! ```

mod config;
mod error;
mod reassembler;
mod sequencer;
mod session;
mod telemetry;
mod transport;

pub use config::*;
pub use error::*;
pub use reassembler::*;
pub use sequencer::*;
pub use session::*;
pub use telemetry::*;
pub use transport::*;
