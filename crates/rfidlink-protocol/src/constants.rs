//! Protocol constants
//!
//! Header markers, destination codes, event codes and register addresses used
//! by the reader's BLE command/response protocol.

// ============================================================================
// Frame Header
// ============================================================================

/// First byte of every frame.
pub const FRAME_PREFIX: u8 = 0xA7;
/// Connection marker for the BLE link.
pub const CONNECTION_BLE: u8 = 0xB3;
/// Reserved/sequence byte. Always this value on downlink.
pub const FRAME_RESERVED: u8 = 0x82;
/// Direction marker for host → reader frames.
pub const DIRECTION_DOWNLINK: u8 = 0x37;
/// Direction marker for reader → host frames.
pub const DIRECTION_UPLINK: u8 = 0x9E;

/// Payload-length indicator written on every RFID command frame.
///
/// The reader firmware expects this value regardless of the opcode length.
pub const COMMAND_PAYLOAD_LEN: u8 = 10;

/// Number of header bytes before the payload.
pub const FRAME_HEADER_LEN: usize = 8;

/// Offset of the payload-length indicator.
pub const OFFSET_LENGTH: usize = 2;
/// Offset of the destination code.
pub const OFFSET_DESTINATION: usize = 3;
/// Offset of the reserved/sequence byte.
pub const OFFSET_RESERVED: usize = 4;
/// Offset of the direction marker.
pub const OFFSET_DIRECTION: usize = 5;
/// Offset of the two CRC bytes.
pub const OFFSET_CRC: usize = 6;

// ============================================================================
// Destinations
// ============================================================================

/// Frames addressed to/from the RFID module.
pub const DEST_RFID: u8 = 0xC2;
/// Frames addressed to/from the notification controller (trigger, battery).
pub const DEST_NOTIFICATION: u8 = 0xD9;

// ============================================================================
// Event Codes (payload bytes 0-1, big-endian)
// ============================================================================

/// Width of the event code at the start of every payload.
pub const EVENT_CODE_LEN: usize = 2;

/// RFID module power-on response.
pub const RFID_EVENT_POWER_ON: u16 = 0x8000;
/// Acknowledgment of a generic register-write command.
pub const RFID_EVENT_COMMAND_ACK: u16 = 0x8002;
/// Tag-read data.
pub const RFID_EVENT_TAG_READ: u16 = 0x8100;

/// Battery voltage report.
pub const NOTIFY_EVENT_BATTERY: u16 = 0xA000;
/// Trigger pushed.
pub const NOTIFY_EVENT_TRIGGER_PUSHED: u16 = 0xA102;
/// Trigger released.
pub const NOTIFY_EVENT_TRIGGER_RELEASED: u16 = 0xA103;

// ============================================================================
// RFID Opcodes
// ============================================================================

/// Power the RFID module on.
pub const OPCODE_POWER_ON: [u8; 2] = [0x80, 0x00];
/// Prefix of a generic RFID command.
pub const OPCODE_COMMAND: [u8; 2] = [0x80, 0x02];
/// Register write sub-command.
pub const REGISTER_WRITE: [u8; 2] = [0x70, 0x01];
/// Abort the running operation.
pub const ABORT_SEQUENCE: [u8; 8] = [0x40, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
/// Query battery voltage (notification destination).
pub const OPCODE_QUERY_BATTERY: [u8; 2] = [0xA0, 0x00];

// ============================================================================
// Reader Registers
// ============================================================================

/// Number of antenna cycles per inventory (0xFFFF = continuous).
pub const REG_ANT_CYCLES: u16 = 0x0700;
/// Antenna port selection.
pub const REG_ANT_PORT_SEL: u16 = 0x0701;
/// Antenna output power, in tenths of a dBm.
pub const REG_ANT_PORT_POWER: u16 = 0x0706;
/// Query configuration (target, session, select).
pub const REG_QUERY_CFG: u16 = 0x0900;
/// Inventory configuration (algorithm and report mode).
pub const REG_INV_CFG: u16 = 0x0901;
/// Inventory algorithm selection.
pub const REG_INV_SEL: u16 = 0x0902;
/// Inventory algorithm parameter 0 (start Q, min/max Q).
pub const REG_INV_ALG_PARM_0: u16 = 0x0903;
/// Current link profile.
pub const REG_CURRENT_PROFILE: u16 = 0x0B60;
/// Host command register.
pub const REG_HST_CMD: u16 = 0xF000;

/// Host command: run an inventory round.
pub const HST_CMD_INVENTORY: u32 = 0x0F;
/// Host command: apply the selected link profile.
pub const HST_CMD_UPDATE_LINK_PROFILE: u32 = 0x19;

// ============================================================================
// Inventory Packets
// ============================================================================

/// Width of the inventory packet header that follows the tag-read event code.
pub const INVENTORY_HEADER_LEN: usize = 8;

/// Compact inventory packet type.
pub const PACKET_TYPE_COMPACT_INVENTORY: u16 = 0x8005;

/// Bytes in front of the first tag record of a batch.
pub const BATCH_PREFIX_LEN: usize = FRAME_HEADER_LEN + EVENT_CODE_LEN + INVENTORY_HEADER_LEN;

// ============================================================================
// Tag Records
// ============================================================================

/// Width of the product-code (PC) field.
pub const PRODUCT_CODE_LEN: usize = 2;
/// Right shift that isolates the EPC length (in 16-bit words) from the PC.
pub const PRODUCT_CODE_LENGTH_SHIFT: u32 = 11;
/// First EPC byte of the visual ID window.
pub const VISUAL_ID_START: usize = 3;
/// Last EPC byte (inclusive) of the visual ID window.
pub const VISUAL_ID_END: usize = 10;
