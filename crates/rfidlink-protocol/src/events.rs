//! Inbound event codes and frame classification.

use crate::constants::*;
use crate::frame::{event_code, Destination, Frame};

/// Events carried by notification-destination frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The trigger was pushed.
    TriggerPushed,
    /// The trigger was released.
    TriggerReleased,
    /// Battery voltage report.
    Battery {
        /// Battery voltage in millivolts.
        millivolts: u16,
    },
    /// Any other notification code.
    Other(u16),
}

impl NotificationEvent {
    /// Decode a notification payload.
    ///
    /// Returns `None` if the payload is too short to carry an event code.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let code = event_code(payload)?;
        let event = match code {
            NOTIFY_EVENT_TRIGGER_PUSHED => NotificationEvent::TriggerPushed,
            NOTIFY_EVENT_TRIGGER_RELEASED => NotificationEvent::TriggerReleased,
            NOTIFY_EVENT_BATTERY => match payload.get(EVENT_CODE_LEN..EVENT_CODE_LEN + 2) {
                Some(mv) => NotificationEvent::Battery {
                    millivolts: u16::from_be_bytes([mv[0], mv[1]]),
                },
                None => NotificationEvent::Other(code),
            },
            other => NotificationEvent::Other(other),
        };
        Some(event)
    }

    /// The event code.
    pub fn code(&self) -> u16 {
        match self {
            NotificationEvent::TriggerPushed => NOTIFY_EVENT_TRIGGER_PUSHED,
            NotificationEvent::TriggerReleased => NOTIFY_EVENT_TRIGGER_RELEASED,
            NotificationEvent::Battery { .. } => NOTIFY_EVENT_BATTERY,
            NotificationEvent::Other(code) => *code,
        }
    }
}

/// Events carried by RFID-destination frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfidEvent {
    /// Acknowledgment of a generic command.
    CommandAck,
    /// Module power-on response.
    PowerOn,
    /// Start of a tag-read batch.
    TagRead,
    /// Any other RFID code.
    Other(u16),
}

impl From<u16> for RfidEvent {
    fn from(code: u16) -> Self {
        match code {
            RFID_EVENT_COMMAND_ACK => RfidEvent::CommandAck,
            RFID_EVENT_POWER_ON => RfidEvent::PowerOn,
            RFID_EVENT_TAG_READ => RfidEvent::TagRead,
            other => RfidEvent::Other(other),
        }
    }
}

impl From<RfidEvent> for u16 {
    fn from(event: RfidEvent) -> Self {
        match event {
            RfidEvent::CommandAck => RFID_EVENT_COMMAND_ACK,
            RfidEvent::PowerOn => RFID_EVENT_POWER_ON,
            RfidEvent::TagRead => RFID_EVENT_TAG_READ,
            RfidEvent::Other(code) => code,
        }
    }
}

/// Classification of one inbound transport delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// A notification-destination frame.
    Notification(NotificationEvent),
    /// An RFID-destination frame.
    Rfid(RfidEvent),
    /// A known destination with no event code in the payload. Still a frame
    /// boundary, but carries nothing to act on.
    HeaderOnly(Destination),
    /// Neither destination matched, or the bytes are shorter than a header.
    /// Treated as a continuation of the current batch.
    Unclassified,
}

impl FrameClass {
    /// True for frames that start a new logical frame and therefore end the
    /// current batch.
    pub fn is_boundary(&self) -> bool {
        !matches!(self, FrameClass::Unclassified)
    }
}

/// Classify raw transport bytes.
pub fn classify(data: &[u8]) -> FrameClass {
    let Ok(frame) = Frame::decode(data) else {
        return FrameClass::Unclassified;
    };
    classify_frame(&frame)
}

/// Classify an already decoded frame.
///
/// Any frame addressed to a known destination is a boundary, whether or not
/// its payload carries an event code.
pub fn classify_frame(frame: &Frame) -> FrameClass {
    let Ok(destination) = frame.destination() else {
        log::trace!(
            "unclassified chunk: destination 0x{:02X}, {} payload bytes",
            frame.header.destination,
            frame.payload.len()
        );
        return FrameClass::Unclassified;
    };

    let class = match destination {
        Destination::Notification => {
            NotificationEvent::decode(&frame.payload).map(FrameClass::Notification)
        }
        Destination::Rfid => frame
            .event_code()
            .map(|code| FrameClass::Rfid(RfidEvent::from(code))),
    };

    class.unwrap_or_else(|| {
        log::trace!(
            "header-only frame: destination 0x{:02X}, {} payload bytes",
            frame.header.destination,
            frame.payload.len()
        );
        FrameClass::HeaderOnly(destination)
    })
}
