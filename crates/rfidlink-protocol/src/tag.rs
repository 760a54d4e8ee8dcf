//! Tag records carried in tag-read batches.
//!
//! A reassembled batch starts with the frame header, the tag-read event code
//! and an 8-byte inventory packet header. The rest is a concatenation of
//! variable-length records:
//!
//! ```text
//! +---------+--------------------+------+
//! | PC (BE) | EPC[(PC >> 11) * 2] | RSSI |
//! +---------+--------------------+------+
//!   2 bytes        n bytes         1 byte
//! ```
//!
//! The top five bits of the product code (PC) give the EPC length in 16-bit
//! words.

use std::iter::FusedIterator;

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Header of an inventory packet, following the tag-read event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryPacketHeader {
    /// Packet format version.
    pub version: u8,
    /// Packet flags.
    pub flags: u8,
    /// Packet type (little-endian on the wire).
    pub packet_type: u16,
    /// Packet length as reported by the module. Not used for bounds.
    pub packet_len: u16,
    /// Reserved.
    pub reserved: u16,
}

impl InventoryPacketHeader {
    /// Decode from the first [`INVENTORY_HEADER_LEN`] bytes of `data`.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < INVENTORY_HEADER_LEN {
            return Err(ProtocolError::truncated(INVENTORY_HEADER_LEN, data.len()));
        }
        Ok(InventoryPacketHeader {
            version: data[0],
            flags: data[1],
            packet_type: u16::from_le_bytes([data[2], data[3]]),
            packet_len: u16::from_le_bytes([data[4], data[5]]),
            reserved: u16::from_le_bytes([data[6], data[7]]),
        })
    }

    /// True for compact inventory packets.
    pub fn is_compact(&self) -> bool {
        self.packet_type == PACKET_TYPE_COMPACT_INVENTORY
    }
}

/// One tag observed during an inventory round.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagRecord {
    /// Raw product code. The top five bits encode the EPC length in words.
    pub product_code: u16,
    /// EPC bytes.
    pub epc: Vec<u8>,
    /// Raw signal strength byte.
    pub rssi: u8,
    /// Decimal ID printed on the tag, derived from the EPC.
    pub visual_id: Option<u64>,
}

impl TagRecord {
    /// Parse one record from the front of `data`, returning it and the rest.
    pub fn parse(data: &[u8]) -> ProtocolResult<(TagRecord, &[u8])> {
        if data.len() < PRODUCT_CODE_LEN {
            return Err(ProtocolError::truncated(PRODUCT_CODE_LEN, data.len()));
        }

        let product_code = u16::from_be_bytes([data[0], data[1]]);
        if product_code == 0 {
            return Err(ProtocolError::InvalidProductCode(product_code));
        }

        let epc_len = epc_len(product_code);
        let record_len = PRODUCT_CODE_LEN + epc_len + 1;
        if data.len() < record_len {
            return Err(ProtocolError::truncated(record_len, data.len()));
        }

        let epc = data[PRODUCT_CODE_LEN..PRODUCT_CODE_LEN + epc_len].to_vec();
        let rssi = data[PRODUCT_CODE_LEN + epc_len];
        let visual_id = visual_id(&epc);

        Ok((
            TagRecord {
                product_code,
                epc,
                rssi,
                visual_id,
            },
            &data[record_len..],
        ))
    }

    /// EPC as uppercase hex.
    pub fn epc_hex(&self) -> String {
        hex::encode_upper(&self.epc)
    }
}

/// EPC length in bytes encoded by a product code.
pub fn epc_len(product_code: u16) -> usize {
    ((product_code >> PRODUCT_CODE_LENGTH_SHIFT) as usize) * 2
}

/// Derive the visual ID from EPC bytes.
///
/// Bytes 3..=10 are reversed and read as a big-endian integer. Returns `None`
/// if the EPC is too short to contain that window.
pub fn visual_id(epc: &[u8]) -> Option<u64> {
    let window = epc.get(VISUAL_ID_START..=VISUAL_ID_END)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(window);
    bytes.reverse();
    Some(u64::from_be_bytes(bytes))
}

/// Lazy, single-pass iterator over the records of a batch body.
///
/// Yields `Err` once on the first malformed record and then stops.
#[derive(Debug, Clone)]
pub struct TagRecords<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> TagRecords<'a> {
    /// Iterate over the records in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        TagRecords {
            remaining: data,
            failed: false,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for TagRecords<'a> {
    type Item = ProtocolResult<TagRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }

        match TagRecord::parse(self.remaining) {
            Ok((record, rest)) => {
                self.remaining = rest;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                self.remaining = &[];
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for TagRecords<'_> {}

/// Extract every record from a batch body, or fail as a whole.
pub fn extract_batch(data: &[u8]) -> ProtocolResult<Vec<TagRecord>> {
    TagRecords::new(data).collect()
}

/// A fully decoded tag-read batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBatch {
    /// Inventory packet header of the first packet.
    pub header: InventoryPacketHeader,
    /// Records in wire order.
    pub records: Vec<TagRecord>,
}

/// Decode a reassembled batch, starting at the frame header of the tag-read
/// frame that opened it.
pub fn decode_batch(buffer: &[u8]) -> ProtocolResult<TagBatch> {
    if buffer.len() < BATCH_PREFIX_LEN {
        return Err(ProtocolError::truncated(BATCH_PREFIX_LEN, buffer.len()));
    }

    let header = InventoryPacketHeader::decode(&buffer[FRAME_HEADER_LEN + EVENT_CODE_LEN..])?;
    log::trace!(
        "inventory packet v{} type 0x{:04X} len {} ({} buffered bytes)",
        header.version,
        header.packet_type,
        header.packet_len,
        buffer.len()
    );

    let records = extract_batch(&buffer[BATCH_PREFIX_LEN..])?;
    Ok(TagBatch { header, records })
}
