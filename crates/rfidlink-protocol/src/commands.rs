//! Commands that can be sent to the reader.
//!
//! Every command is a fixed byte sequence; nothing here carries runtime
//! arguments. Most RFID commands are register writes of the form
//! `80 02 70 01 <addr u16 LE> <value u32 LE>`.

use crate::constants::*;
use crate::frame::{encode_command, encode_with_len, Destination};

/// Commands understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Power the RFID module on. First command to send.
    PowerOnModule,
    /// Select antenna port 0.
    SelectAntennaPort,
    /// Set antenna output power to 30.0 dBm.
    SetAntennaPower,
    /// Select link profile 1.
    SelectProfile,
    /// Apply the selected link profile.
    EnableProfile,
    /// Run antenna cycles continuously until aborted.
    SetAntennaCycles,
    /// Configure the query (session, target, select).
    SetQueryConfig,
    /// Select the dynamic-Q inventory algorithm.
    SelectInventoryAlgorithm,
    /// Set start/min/max Q for the inventory algorithm.
    SetInventoryAlgorithmParams,
    /// Configure inventory reporting in compact mode.
    SetInventoryConfig,
    /// Start an inventory round.
    StartInventory,
    /// Abort the running inventory.
    AbortInventory,
    /// Ask the notification controller for the battery voltage.
    QueryBattery,
}

/// Commands sent, in order, to bring the reader into a scanning-ready state.
const INITIALIZATION_SEQUENCE: [Command; 10] = [
    Command::PowerOnModule,
    Command::SelectAntennaPort,
    Command::SetAntennaPower,
    Command::SelectProfile,
    Command::EnableProfile,
    Command::SetAntennaCycles,
    Command::SetQueryConfig,
    Command::SelectInventoryAlgorithm,
    Command::SetInventoryAlgorithmParams,
    Command::SetInventoryConfig,
];

/// The ordered initialization sequence.
///
/// Each entry must be sent as a discrete write, in order.
pub fn initialization_sequence() -> &'static [Command] {
    &INITIALIZATION_SEQUENCE
}

/// Build a register-write opcode.
pub const fn register_write(register: u16, value: u32) -> [u8; 10] {
    let addr = register.to_le_bytes();
    let val = value.to_le_bytes();
    [
        OPCODE_COMMAND[0],
        OPCODE_COMMAND[1],
        REGISTER_WRITE[0],
        REGISTER_WRITE[1],
        addr[0],
        addr[1],
        val[0],
        val[1],
        val[2],
        val[3],
    ]
}

const fn abort_opcode() -> [u8; 10] {
    let mut buf = [0u8; 10];
    buf[0] = OPCODE_COMMAND[0];
    buf[1] = OPCODE_COMMAND[1];
    let mut i = 0;
    while i < ABORT_SEQUENCE.len() {
        buf[2 + i] = ABORT_SEQUENCE[i];
        i += 1;
    }
    buf
}

const SELECT_ANTENNA_PORT: [u8; 10] = register_write(REG_ANT_PORT_SEL, 0);
const SET_ANTENNA_POWER: [u8; 10] = register_write(REG_ANT_PORT_POWER, 300);
const SELECT_PROFILE: [u8; 10] = register_write(REG_CURRENT_PROFILE, 1);
const ENABLE_PROFILE: [u8; 10] = register_write(REG_HST_CMD, HST_CMD_UPDATE_LINK_PROFILE);
const SET_ANTENNA_CYCLES: [u8; 10] = register_write(REG_ANT_CYCLES, 0xFFFF);
const SET_QUERY_CONFIG: [u8; 10] = register_write(REG_QUERY_CFG, 0x0180);
const SELECT_INVENTORY_ALGORITHM: [u8; 10] = register_write(REG_INV_SEL, 3);
const SET_INVENTORY_ALGORITHM_PARAMS: [u8; 10] = register_write(REG_INV_ALG_PARM_0, 0x40F4);
const SET_INVENTORY_CONFIG: [u8; 10] = register_write(REG_INV_CFG, 0x0400_0001);
const START_INVENTORY: [u8; 10] = register_write(REG_HST_CMD, HST_CMD_INVENTORY);
const ABORT_INVENTORY: [u8; 10] = abort_opcode();
const QUERY_BATTERY_LEN: u8 = OPCODE_QUERY_BATTERY.len() as u8;

impl Command {
    /// Human-readable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::PowerOnModule => "turn on module",
            Command::SelectAntennaPort => "select antenna port",
            Command::SetAntennaPower => "set antenna power",
            Command::SelectProfile => "select profile",
            Command::EnableProfile => "enable profile",
            Command::SetAntennaCycles => "set antenna cycles",
            Command::SetQueryConfig => "query configuration",
            Command::SelectInventoryAlgorithm => "select inventory algorithm",
            Command::SetInventoryAlgorithmParams => "inventory algorithm parameters",
            Command::SetInventoryConfig => "inventory configuration",
            Command::StartInventory => "start inventory",
            Command::AbortInventory => "abort inventory",
            Command::QueryBattery => "query battery",
        }
    }

    /// Destination the command is addressed to.
    pub fn destination(&self) -> Destination {
        match self {
            Command::QueryBattery => Destination::Notification,
            _ => Destination::Rfid,
        }
    }

    /// Opcode and argument bytes, without the frame header.
    pub fn opcode(&self) -> &'static [u8] {
        match self {
            Command::PowerOnModule => &OPCODE_POWER_ON,
            Command::SelectAntennaPort => &SELECT_ANTENNA_PORT,
            Command::SetAntennaPower => &SET_ANTENNA_POWER,
            Command::SelectProfile => &SELECT_PROFILE,
            Command::EnableProfile => &ENABLE_PROFILE,
            Command::SetAntennaCycles => &SET_ANTENNA_CYCLES,
            Command::SetQueryConfig => &SET_QUERY_CONFIG,
            Command::SelectInventoryAlgorithm => &SELECT_INVENTORY_ALGORITHM,
            Command::SetInventoryAlgorithmParams => &SET_INVENTORY_ALGORITHM_PARAMS,
            Command::SetInventoryConfig => &SET_INVENTORY_CONFIG,
            Command::StartInventory => &START_INVENTORY,
            Command::AbortInventory => &ABORT_INVENTORY,
            Command::QueryBattery => &OPCODE_QUERY_BATTERY,
        }
    }

    /// Encode the command as a complete wire frame.
    pub fn encode(&self) -> Vec<u8> {
        match self.destination() {
            Destination::Rfid => encode_command(self.opcode()),
            Destination::Notification => encode_with_len(
                Destination::Notification,
                QUERY_BATTERY_LEN,
                self.opcode(),
            ),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
