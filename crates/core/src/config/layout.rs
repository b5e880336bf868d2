//! Storage layout
//!
//! Fixed byte offsets inside the global unit (at address 0) and each
//! 256-byte profile unit. Mutators persist only the field they touched, so
//! these offsets are part of the storage format and must not move.

use super::types::{
    decode_port, encode_port, AnalogSource, AxisCalibration, GlobalConfig, PortSwitch, Profile,
    ProfileKind, SwitchKind, NUM_AXES, NUM_PORTS,
};
use heapless::String;

/// Marks an initialized image, little-endian at address 0.
pub const INIT_SENTINEL: u32 = 0xAF06_CAFA;

// Global unit field offsets.
pub const G_SENTINEL: usize = 0x00;
pub const G_ACTIVE_SLOTS: usize = 0x04;
pub const G_CURRENT_SLOT: usize = 0x08;
pub const G_AXIS_CHANNELS: usize = 0x09;
pub const G_SWITCH_KINDS: usize = 0x0D;
pub const G_SWITCH_CH1: usize = 0x27;
pub const G_SWITCH_CH2: usize = 0x41;
pub const G_IN_MIDPOINT: usize = 0x5B;
pub const G_IN_MARGIN: usize = 0x63;
pub const G_IN_INVERTED: usize = 0x6B;
pub const G_OUT_MIDPOINT: usize = 0x6F;
pub const G_OUT_MARGIN: usize = 0x77;
pub const G_OUT_INVERTED: usize = 0x7F;
pub const GLOBAL_LEN: usize = 0x83;

// Profile unit field offsets, relative to the unit base.
pub const P_KIND: usize = 0x00;
pub const P_NAME: usize = 0x01;
pub const P_NAME_LEN: usize = 16;
pub const P_BUDDY_PORTS: usize = 0x11;
pub const P_SOURCES: usize = 0x15;
pub const P_DEADZONE: usize = 0x19;
pub const P_TEACHER_PORT: usize = 0x1D;
pub const PROFILE_LEN: usize = 0x1E;

/// Base address of profile slot `n`.
pub fn profile_addr(slot: u8) -> u32 {
    (u32::from(slot) + 1) << 8
}

fn put_cal(buf: &mut [u8], mid_off: usize, margin_off: usize, inv_off: usize, cal: &[AxisCalibration; NUM_AXES]) {
    for (i, c) in cal.iter().enumerate() {
        buf[mid_off + 2 * i..mid_off + 2 * i + 2].copy_from_slice(&c.midpoint.to_le_bytes());
        buf[margin_off + 2 * i..margin_off + 2 * i + 2].copy_from_slice(&c.margin.to_le_bytes());
        buf[inv_off + i] = c.inverted as u8;
    }
}

fn get_cal(buf: &[u8], mid_off: usize, margin_off: usize, inv_off: usize) -> [AxisCalibration; NUM_AXES] {
    let mut cal = [AxisCalibration::default(); NUM_AXES];
    for (i, c) in cal.iter_mut().enumerate() {
        c.midpoint = u16::from_le_bytes([buf[mid_off + 2 * i], buf[mid_off + 2 * i + 1]]);
        c.margin = u16::from_le_bytes([buf[margin_off + 2 * i], buf[margin_off + 2 * i + 1]]);
        c.inverted = buf[inv_off + i] != 0;
    }
    cal
}

pub fn encode_global(g: &GlobalConfig) -> [u8; GLOBAL_LEN] {
    let mut buf = [0u8; GLOBAL_LEN];
    buf[G_SENTINEL..G_SENTINEL + 4].copy_from_slice(&INIT_SENTINEL.to_le_bytes());
    buf[G_ACTIVE_SLOTS..G_ACTIVE_SLOTS + 4].copy_from_slice(&g.active_slots.to_le_bytes());
    buf[G_CURRENT_SLOT] = g.current_slot;
    buf[G_AXIS_CHANNELS..G_AXIS_CHANNELS + NUM_AXES].copy_from_slice(&g.axis_channels);
    for (i, sw) in g.switches.iter().enumerate() {
        buf[G_SWITCH_KINDS + i] = sw.kind.to_byte();
        buf[G_SWITCH_CH1 + i] = encode_port(sw.ch1);
        buf[G_SWITCH_CH2 + i] = encode_port(sw.ch2);
    }
    put_cal(&mut buf, G_IN_MIDPOINT, G_IN_MARGIN, G_IN_INVERTED, &g.input_cal);
    put_cal(&mut buf, G_OUT_MIDPOINT, G_OUT_MARGIN, G_OUT_INVERTED, &g.output_cal);
    buf
}

pub fn decode_global(buf: &[u8; GLOBAL_LEN]) -> GlobalConfig {
    let mut switches = [PortSwitch {
        kind: SwitchKind::None,
        ch1: None,
        ch2: None,
    }; NUM_PORTS];
    for (i, sw) in switches.iter_mut().enumerate() {
        sw.kind = SwitchKind::from_byte(buf[G_SWITCH_KINDS + i]);
        sw.ch1 = decode_port(buf[G_SWITCH_CH1 + i]);
        sw.ch2 = decode_port(buf[G_SWITCH_CH2 + i]);
    }
    let mut axis_channels = [0u8; NUM_AXES];
    axis_channels.copy_from_slice(&buf[G_AXIS_CHANNELS..G_AXIS_CHANNELS + NUM_AXES]);
    GlobalConfig {
        active_slots: u32::from_le_bytes([
            buf[G_ACTIVE_SLOTS],
            buf[G_ACTIVE_SLOTS + 1],
            buf[G_ACTIVE_SLOTS + 2],
            buf[G_ACTIVE_SLOTS + 3],
        ]),
        current_slot: buf[G_CURRENT_SLOT],
        axis_channels,
        switches,
        input_cal: get_cal(buf, G_IN_MIDPOINT, G_IN_MARGIN, G_IN_INVERTED),
        output_cal: get_cal(buf, G_OUT_MIDPOINT, G_OUT_MARGIN, G_OUT_INVERTED),
    }
}

pub fn encode_profile(p: &Profile) -> [u8; PROFILE_LEN] {
    let mut buf = [0u8; PROFILE_LEN];
    buf[P_KIND] = p.kind.to_byte();
    let name = p.name.as_bytes();
    buf[P_NAME..P_NAME + name.len()].copy_from_slice(name);
    for i in 0..NUM_AXES {
        buf[P_BUDDY_PORTS + i] = encode_port(p.buddy_ports[i]);
        buf[P_SOURCES + i] = p.sources[i].to_byte();
        buf[P_DEADZONE + i] = p.deadzone[i];
    }
    buf[P_TEACHER_PORT] = encode_port(p.teacher_port);
    buf
}

pub fn decode_profile(buf: &[u8; PROFILE_LEN]) -> Profile {
    let mut name: String<15> = String::new();
    for &b in &buf[P_NAME..P_NAME + P_NAME_LEN - 1] {
        if b == 0 || b == 0xFF {
            break;
        }
        // Capacity matches the stored field; non-ASCII bytes are dropped.
        if b.is_ascii() {
            let _ = name.push(b as char);
        }
    }
    let mut sources = [AnalogSource::None; NUM_AXES];
    let mut deadzone = [0u8; NUM_AXES];
    let mut buddy_ports = [None; NUM_AXES];
    for i in 0..NUM_AXES {
        buddy_ports[i] = decode_port(buf[P_BUDDY_PORTS + i]);
        sources[i] = AnalogSource::from_byte(buf[P_SOURCES + i]);
        deadzone[i] = buf[P_DEADZONE + i];
    }
    Profile {
        kind: ProfileKind::from_byte(buf[P_KIND]),
        name,
        sources,
        deadzone,
        buddy_ports,
        teacher_port: decode_port(buf[P_TEACHER_PORT]),
    }
}
