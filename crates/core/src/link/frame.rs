//! 10-byte frame format
//!
//! ```text
//! byte 0..8   four analog channels, 12 bit little-endian pairs; the high
//!             nibble of each odd byte carries four digital channels
//!             (digital 0..16)
//! byte 8      digital channels 16..24
//! byte 9      CRC-8 over bytes 0..9
//! ```
//!
//! Digital `true` means the line is high, i.e. released by the sinking
//! driver (inactive).

use super::crc::crc8;

pub const FRAME_LEN: usize = 10;

/// Everything one frame carries: the analog and digital picture of one
/// side of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoState {
    pub analog: [u16; 4],
    pub digital: [bool; 24],
}

impl Default for IoState {
    /// Idle picture: axes at midscale, all digital lines released.
    fn default() -> Self {
        Self {
            analog: [2047; 4],
            digital: [true; 24],
        }
    }
}

pub fn pack(state: &IoState) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    for ch in 0..4 {
        let a = state.analog[ch] & 0x0FFF;
        let mut nibble = 0u8;
        for bit in 0..4 {
            if state.digital[4 * ch + bit] {
                nibble |= 1 << bit;
            }
        }
        frame[2 * ch] = (a & 0xFF) as u8;
        frame[2 * ch + 1] = ((a >> 8) as u8) | (nibble << 4);
    }
    for bit in 0..8 {
        if state.digital[16 + bit] {
            frame[8] |= 1 << bit;
        }
    }
    frame[9] = crc8(&frame[..9]);
    frame
}

/// Decodes a frame without checking its checksum; call [`validate`] first.
pub fn unpack(frame: &[u8; FRAME_LEN]) -> IoState {
    let mut state = IoState {
        analog: [0; 4],
        digital: [false; 24],
    };
    for ch in 0..4 {
        state.analog[ch] =
            u16::from(frame[2 * ch]) | (u16::from(frame[2 * ch + 1] & 0x0F) << 8);
        let nibble = frame[2 * ch + 1] >> 4;
        for bit in 0..4 {
            state.digital[4 * ch + bit] = nibble & (1 << bit) != 0;
        }
    }
    for bit in 0..8 {
        state.digital[16 + bit] = frame[8] & (1 << bit) != 0;
    }
    state
}

pub fn validate(frame: &[u8; FRAME_LEN]) -> bool {
    crc8(&frame[..9]) == frame[9]
}
