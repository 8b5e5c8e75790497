//! Configuration constants for the Scubapro G2 download protocol.

use serde::{Deserialize, Serialize};

// ============================================================================
// USB Device Identifiers
// ============================================================================

/// Scubapro USB Vendor ID.
pub const SCUBAPRO_VID: u16 = 0x2E6C;

/// Product ID of the G2 family (wrist unit, console and HUD share it).
pub const G2_PID: u16 = 0x3201;

// ============================================================================
// Packet Framing
// ============================================================================

/// Fixed size of every HID report exchanged with the device.
pub const PACKET_SIZE: usize = 64;

/// Largest command payload that fits in one packet after the length byte.
pub const MAX_COMMAND_SIZE: usize = PACKET_SIZE - 2;

// ============================================================================
// Command Opcodes
// ============================================================================

/// Single-byte opcodes understood by the G2 firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum G2Opcode {
    /// Read the one-byte model code.
    Model = 0x10,
    /// Read the four-byte serial number.
    Serial = 0x14,
    /// Read the device clock (half-second ticks).
    DeviceTime = 0x1A,
    /// Bulk transfer handshake; answers with the payload size plus four.
    Data = 0xC4,
    /// Ask how many bytes are newer than the fingerprint.
    DataLength = 0xC6,
}

/// Fixed trailer of the length/data commands (0x2710 = 10000, little-endian).
pub const DATA_COMMAND_TRAILER: [u8; 4] = [0x10, 0x27, 0x00, 0x00];

/// Size of the length/data command template.
pub const DATA_COMMAND_SIZE: usize = 9;

/// Bytes consumed by the model, serial and clock probes.
pub const PROBE_BYTES: u32 = 1 + 4 + 4;

/// Size of the length answer, counted once in the progress maximum.
pub const LENGTH_ANSWER_BYTES: u32 = 4;

/// Build the 9-byte length/data command for a given opcode and cursor.
pub fn data_command(opcode: G2Opcode, timestamp: u32) -> [u8; DATA_COMMAND_SIZE] {
    let ts = timestamp.to_le_bytes();
    let mut command = [0u8; DATA_COMMAND_SIZE];
    command[0] = opcode as u8;
    command[1..5].copy_from_slice(&ts);
    command[5..9].copy_from_slice(&DATA_COMMAND_TRAILER);
    command
}

/// Total number of bytes a dump transfers once `length` is known.
pub fn progress_maximum(length: u32) -> u32 {
    let payload = if length > 0 { length.saturating_add(4) } else { 0 };
    payload.saturating_add(LENGTH_ANSWER_BYTES + PROBE_BYTES)
}

// ============================================================================
// Dive Records
// ============================================================================

/// Start-of-dive marker inside the memory dump.
pub const DIVE_MARKER: [u8; 4] = [0xA5, 0xA5, 0x5A, 0x5A];

/// Offset of the little-endian record length after the marker start.
pub const DIVE_LENGTH_OFFSET: usize = 4;

/// Offset of the four fingerprint bytes after the marker start.
pub const DIVE_FINGERPRINT_OFFSET: usize = 8;

/// Size of a dive fingerprint.
pub const FINGERPRINT_SIZE: usize = 4;

/// Marker, length and fingerprint together.
pub const DIVE_HEADER_SIZE: usize = DIVE_FINGERPRINT_OFFSET + FINGERPRINT_SIZE;

// ============================================================================
// Device Families
// ============================================================================

/// Device families this crate knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    ScubaproG2,
}

impl DeviceFamily {
    /// Short name used for cache file names and logs.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceFamily::ScubaproG2 => "scubapro_g2",
        }
    }

    /// USB identifiers the family enumerates with.
    pub fn usb_ids(&self) -> (u16, u16) {
        match self {
            DeviceFamily::ScubaproG2 => (SCUBAPRO_VID, G2_PID),
        }
    }
}

/// Check if a VID/PID combination belongs to a G2 device.
pub fn is_compatible_device(vid: u16, pid: u16) -> bool {
    DeviceFamily::ScubaproG2.usb_ids() == (vid, pid)
}
