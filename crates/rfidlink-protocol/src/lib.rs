//! Handheld UHF RFID Reader Protocol
//!
//! This crate provides types and utilities for talking to a handheld UHF RFID
//! reader over its BLE command/response protocol. It is a pure codec: no I/O,
//! no state beyond what a caller passes in.
//!
//! # Protocol Overview
//!
//! Every frame carries an 8-byte header (prefix, connection marker, payload
//! length, destination, reserved, direction, CRC) followed by a payload whose
//! first two bytes are an event or command code.
//!
//! - **Commands** (host → reader): RFID-destination frames built from a fixed
//!   catalog of opcodes
//! - **Notifications** (reader → host): trigger pushed/released, battery level
//! - **RFID events** (reader → host): command acknowledgments and tag-read
//!   data, the latter often split across several transport deliveries
//!
//! # Example
//!
//! ```rust,ignore
//! use rfidlink_protocol::{classify, decode_batch, Command, FrameClass};
//!
//! // Build a command
//! let frame = Command::StartInventory.encode();
//!
//! // Classify an inbound delivery
//! match classify(&received) {
//!     FrameClass::Rfid(event) => { /* ... */ }
//!     _ => {}
//! }
//!
//! // Parse a reassembled batch
//! let batch = decode_batch(&buffer)?;
//! ```

mod commands;
mod constants;
mod error;
mod events;
mod frame;
mod tag;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use tag::*;
