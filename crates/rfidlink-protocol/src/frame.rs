//! Frame encoding/decoding.
//!
//! Every frame exchanged with the reader carries an 8-byte header followed by
//! a variable payload:
//!
//! ```text
//! +--------+------+-----+------+-----+-----+-------+---------------+
//! | prefix | conn | len | dest | rsv | dir | crc16 | payload[..]   |
//! |  0xA7  | 0xB3 |     |      |     |     |       |               |
//! +--------+------+-----+------+-----+-----+-------+---------------+
//!     0       1      2     3      4     5    6..8       8..
//! ```
//!
//! The CRC is carried but never verified. The length indicator is declared by
//! the protocol but not trusted for bounds; see [`Frame::validate_length`].

use bytes::{BufMut, Bytes};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Frame destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// RFID module.
    Rfid,
    /// Notification controller (trigger, battery).
    Notification,
}

impl Destination {
    /// Wire code for this destination.
    pub fn code(self) -> u8 {
        match self {
            Destination::Rfid => DEST_RFID,
            Destination::Notification => DEST_NOTIFICATION,
        }
    }
}

impl TryFrom<u8> for Destination {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            DEST_RFID => Ok(Destination::Rfid),
            DEST_NOTIFICATION => Ok(Destination::Notification),
            other => Err(ProtocolError::UnrecognizedDestination(other)),
        }
    }
}

impl From<Destination> for u8 {
    fn from(dest: Destination) -> Self {
        dest.code()
    }
}

/// The fixed 8-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Prefix marker (byte 0).
    pub prefix: u8,
    /// Connection marker (byte 1).
    pub connection: u8,
    /// Declared payload length (byte 2). Not trusted for bounds.
    pub declared_len: u8,
    /// Raw destination code (byte 3).
    pub destination: u8,
    /// Reserved/sequence byte (byte 4).
    pub reserved: u8,
    /// Direction marker (byte 5).
    pub direction: u8,
    /// CRC bytes (6-7). Carried, never checked.
    pub crc: [u8; 2],
}

impl FrameHeader {
    /// Header used for every downlink frame, minus the destination and length.
    pub fn downlink(destination: Destination, declared_len: u8) -> Self {
        FrameHeader {
            prefix: FRAME_PREFIX,
            connection: CONNECTION_BLE,
            declared_len,
            destination: destination.code(),
            reserved: FRAME_RESERVED,
            direction: DIRECTION_DOWNLINK,
            crc: [0, 0],
        }
    }

    /// Parse a header from the first [`FRAME_HEADER_LEN`] bytes of `data`.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(ProtocolError::truncated(FRAME_HEADER_LEN, data.len()));
        }

        Ok(FrameHeader {
            prefix: data[0],
            connection: data[1],
            declared_len: data[OFFSET_LENGTH],
            destination: data[OFFSET_DESTINATION],
            reserved: data[OFFSET_RESERVED],
            direction: data[OFFSET_DIRECTION],
            crc: [data[OFFSET_CRC], data[OFFSET_CRC + 1]],
        })
    }

    /// Write the header into `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.prefix);
        buf.put_u8(self.connection);
        buf.put_u8(self.declared_len);
        buf.put_u8(self.destination);
        buf.put_u8(self.reserved);
        buf.put_u8(self.direction);
        buf.put_slice(&self.crc);
    }
}

/// A decoded frame: header plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Parsed header.
    pub header: FrameHeader,
    /// Payload bytes (everything after the header).
    pub payload: Bytes,
}

impl Frame {
    /// Decode a frame from raw transport bytes.
    ///
    /// Fails with [`ProtocolError::TruncatedFrame`] when `data` is shorter than
    /// the header. The destination is not validated here; use
    /// [`Frame::destination`] for that.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        let header = FrameHeader::decode(data)?;
        Ok(Frame {
            header,
            payload: Bytes::copy_from_slice(&data[FRAME_HEADER_LEN..]),
        })
    }

    /// The frame's destination, or `UnrecognizedDestination`.
    pub fn destination(&self) -> ProtocolResult<Destination> {
        Destination::try_from(self.header.destination)
    }

    /// True if the destination is the notification controller.
    pub fn is_notification(&self) -> bool {
        self.header.destination == DEST_NOTIFICATION
    }

    /// True if the destination is the RFID module.
    pub fn is_rfid(&self) -> bool {
        self.header.destination == DEST_RFID
    }

    /// Event code at the start of the payload, if present.
    pub fn event_code(&self) -> Option<u16> {
        event_code(&self.payload)
    }

    /// Check the payload against the declared length indicator.
    ///
    /// Only over-long payloads are rejected: an uplink frame split by the
    /// transport legitimately carries fewer bytes than it declares.
    pub fn validate_length(&self) -> ProtocolResult<()> {
        let declared = self.header.declared_len as usize;
        if self.payload.len() > declared {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }
}

/// Read the 2-byte big-endian event code at the start of a payload.
pub fn event_code(payload: &[u8]) -> Option<u16> {
    match payload {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

/// Event code rendered as four uppercase hex digits, as it appears in logs.
pub fn event_code_hex(payload: &[u8]) -> Option<String> {
    payload
        .get(..EVENT_CODE_LEN)
        .map(hex::encode_upper)
}

/// Decode the destination and payload of a raw frame.
pub fn decode_frame(data: &[u8]) -> ProtocolResult<Frame> {
    Frame::decode(data)
}

/// Build an RFID command frame around an opcode.
///
/// The length indicator is always [`COMMAND_PAYLOAD_LEN`], whatever the
/// opcode length; the reader firmware expects that.
pub fn encode_command(opcode: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + opcode.len());
    FrameHeader::downlink(Destination::Rfid, COMMAND_PAYLOAD_LEN).encode_into(&mut buf);
    buf.put_slice(opcode);
    log::trace!("encoded RFID command {}", hex::encode_upper(opcode));
    buf
}

/// Build a downlink frame for any destination with the real payload length.
///
/// Fails with [`ProtocolError::PayloadTooLong`] if the payload does not fit
/// the one-byte length indicator.
pub fn encode_frame(destination: Destination, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let declared = u8::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLong {
        len: payload.len(),
        max: usize::from(u8::MAX),
    })?;
    Ok(encode_with_len(destination, declared, payload))
}

pub(crate) fn encode_with_len(destination: Destination, declared: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    FrameHeader::downlink(destination, declared).encode_into(&mut buf);
    buf.put_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command_header() {
        let frame = encode_command(&[0x80, 0x00]);
        assert_eq!(
            frame,
            vec![0xA7, 0xB3, 0x0A, 0xC2, 0x82, 0x37, 0x00, 0x00, 0x80, 0x00]
        );
    }

    #[test]
    fn test_decode_encoded_command() {
        let opcode = [0x80, 0x02, 0x70, 0x01, 0x00, 0xF0, 0x0F, 0x00, 0x00, 0x00];
        let frame = decode_frame(&encode_command(&opcode)).expect("should decode");

        assert_eq!(frame.destination(), Ok(Destination::Rfid));
        assert!(frame.is_rfid());
        assert!(!frame.is_notification());
        assert_eq!(&frame.payload[..], &opcode);
        assert_eq!(frame.header.direction, DIRECTION_DOWNLINK);
    }

    #[test]
    fn test_decode_short_frame() {
        for len in 0..FRAME_HEADER_LEN {
            let data = vec![0xA7; len];
            assert_eq!(
                decode_frame(&data),
                Err(ProtocolError::TruncatedFrame {
                    expected: FRAME_HEADER_LEN,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_decode_header_only() {
        let frame = decode_frame(&[0xA7, 0xB3, 0x00, 0xD9, 0x82, 0x9E, 0x00, 0x00])
            .expect("should decode");
        assert!(frame.is_notification());
        assert!(frame.payload.is_empty());
        assert_eq!(frame.event_code(), None);
    }

    #[test]
    fn test_unrecognized_destination() {
        let frame = decode_frame(&[0xA7, 0xB3, 0x02, 0x6A, 0x82, 0x9E, 0x00, 0x00, 0x90, 0x00])
            .expect("should decode");
        assert!(!frame.is_rfid());
        assert!(!frame.is_notification());
        assert_eq!(
            frame.destination(),
            Err(ProtocolError::UnrecognizedDestination(0x6A))
        );
    }

    #[test]
    fn test_event_code() {
        assert_eq!(event_code(&[0x81, 0x00, 0x04]), Some(0x8100));
        assert_eq!(event_code(&[0x81]), None);
        assert_eq!(event_code_hex(&[0xA1, 0x02]), Some("A102".to_string()));
        assert_eq!(event_code_hex(&[]), None);
    }

    #[test]
    fn test_validate_length() {
        // Command frames declare 10 regardless of opcode length.
        let short = decode_frame(&encode_command(&[0x80, 0x00])).unwrap();
        assert!(short.validate_length().is_ok());

        let long_opcode = [0u8; 12];
        let long = decode_frame(&encode_command(&long_opcode)).unwrap();
        assert_eq!(
            long.validate_length(),
            Err(ProtocolError::LengthMismatch {
                declared: 10,
                actual: 12
            })
        );
    }

    #[test]
    fn test_encode_frame_notification() {
        let frame = encode_frame(Destination::Notification, &OPCODE_QUERY_BATTERY).unwrap();
        assert_eq!(
            frame,
            vec![0xA7, 0xB3, 0x02, 0xD9, 0x82, 0x37, 0x00, 0x00, 0xA0, 0x00]
        );
    }

    #[test]
    fn test_encode_frame_length_limit() {
        let frame = encode_frame(Destination::Rfid, &[0x55; 255]).unwrap();
        assert_eq!(frame[OFFSET_LENGTH], 0xFF);
        assert_eq!(frame.len(), FRAME_HEADER_LEN + 255);

        assert_eq!(
            encode_frame(Destination::Rfid, &[0x55; 256]),
            Err(ProtocolError::PayloadTooLong { len: 256, max: 255 })
        );
    }
}
