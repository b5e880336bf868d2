//! Typed configuration records
//!
//! The wire encodings (`to_byte`/`from_byte`) are what lands in storage and
//! must stay stable across firmware versions.

use heapless::String;

pub const NUM_AXES: usize = 4;
pub const NUM_PORTS: usize = 26;
pub const NUM_SLOTS: usize = 32;

/// Wire value for an unassigned digital port or channel.
pub(crate) const UNUSED: u8 = 0xFF;

/// Switch behavior emulated on a digital output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchKind {
    None,
    TwoPosition,
    ThreePosition,
    MomentaryTwoPosition,
}

impl SwitchKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            SwitchKind::None => 0,
            SwitchKind::TwoPosition => 1,
            SwitchKind::ThreePosition => 2,
            SwitchKind::MomentaryTwoPosition => 3,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Self {
        match b {
            1 => SwitchKind::TwoPosition,
            2 => SwitchKind::ThreePosition,
            3 => SwitchKind::MomentaryTwoPosition,
            _ => SwitchKind::None,
        }
    }
}

/// One digital output port: emulated switch kind plus up to two physical
/// channels on the remote unit. `ch2` is only meaningful for
/// [`SwitchKind::ThreePosition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortSwitch {
    pub kind: SwitchKind,
    pub ch1: Option<u8>,
    pub ch2: Option<u8>,
}

impl PortSwitch {
    const fn unused() -> Self {
        Self {
            kind: SwitchKind::None,
            ch1: None,
            ch2: None,
        }
    }
}

/// Midpoint/margin pair describing one analog channel, either as sampled
/// (input) or as driven (output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCalibration {
    pub midpoint: u16,
    pub margin: u16,
    pub inverted: bool,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self {
            midpoint: 2047,
            margin: 2000,
            inverted: false,
        }
    }
}

/// Board-level configuration shared by all profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub active_slots: u32,
    pub current_slot: u8,
    /// Physical remote-unit analog channel driven by each output axis.
    pub axis_channels: [u8; NUM_AXES],
    pub switches: [PortSwitch; NUM_PORTS],
    pub input_cal: [AxisCalibration; NUM_AXES],
    pub output_cal: [AxisCalibration; NUM_AXES],
}

impl Default for GlobalConfig {
    /// Factory port map of the shipped remote-unit board.
    fn default() -> Self {
        const KINDS: [SwitchKind; NUM_PORTS] = {
            use SwitchKind::*;
            [
                ThreePosition, ThreePosition, ThreePosition, ThreePosition, ThreePosition,
                TwoPosition, ThreePosition,
                MomentaryTwoPosition, MomentaryTwoPosition, MomentaryTwoPosition,
                MomentaryTwoPosition, MomentaryTwoPosition, MomentaryTwoPosition,
                MomentaryTwoPosition, MomentaryTwoPosition, MomentaryTwoPosition,
                MomentaryTwoPosition,
                None, None, None, None, None, None, None, None, None,
            ]
        };
        const CH1: [u8; NUM_PORTS] = [
            14, 11, 10, 7, 16, 23, 5, 22, 13, 21, 20, 19, 18, 0, 1, 2, 3, UNUSED, UNUSED,
            UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
        ];
        const CH2: [u8; NUM_PORTS] = [
            15, 12, 9, 6, 17, UNUSED, 4, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
            UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
            UNUSED, UNUSED, UNUSED,
        ];

        let mut switches = [PortSwitch::unused(); NUM_PORTS];
        let mut i = 0;
        while i < NUM_PORTS {
            switches[i] = PortSwitch {
                kind: KINDS[i],
                ch1: decode_port(CH1[i]),
                ch2: decode_port(CH2[i]),
            };
            i += 1;
        }

        Self {
            active_slots: 0x0000_0001,
            current_slot: 0,
            axis_channels: [2, 3, 1, 0],
            switches,
            input_cal: [AxisCalibration::default(); NUM_AXES],
            output_cal: [AxisCalibration::default(); NUM_AXES],
        }
    }
}

pub(crate) fn encode_port(p: Option<u8>) -> u8 {
    p.unwrap_or(UNUSED)
}

pub(crate) const fn decode_port(b: u8) -> Option<u8> {
    if b == UNUSED {
        None
    } else {
        Some(b)
    }
}

/// Role a profile configures the device pair for. Only the remote-unit
/// role exists today; the storage encoding leaves room for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileKind {
    #[default]
    RemoteUnit,
}

impl ProfileKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            ProfileKind::RemoteUnit => 0,
        }
    }

    pub(crate) fn from_byte(_b: u8) -> Self {
        ProfileKind::RemoteUnit
    }
}

/// Value driven onto one output axis each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogSource {
    /// Axis is not driven; the previous value is retained.
    #[default]
    None,
    /// Transformed sample of a local joystick axis.
    Local(u8),
    /// Telemetry value of a remote analog channel, passed through.
    Remote(u8),
}

impl AnalogSource {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            AnalogSource::Local(n) => n,
            AnalogSource::Remote(n) => 4 + n,
            AnalogSource::None => 8,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Self {
        match b {
            0..=3 => AnalogSource::Local(b),
            4..=7 => AnalogSource::Remote(b - 4),
            _ => AnalogSource::None,
        }
    }
}

/// One configuration slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub kind: ProfileKind,
    pub name: String<15>,
    /// Source feeding each of the four output axes.
    pub sources: [AnalogSource; NUM_AXES],
    /// Per input axis, stored undoubled; the transform doubles it.
    pub deadzone: [u8; NUM_AXES],
    /// Digital port assigned to each buddy button.
    pub buddy_ports: [Option<u8>; NUM_AXES],
    pub teacher_port: Option<u8>,
}

impl Default for Profile {
    fn default() -> Self {
        let mut name = String::new();
        // "Default" always fits the 15-byte capacity.
        let _ = name.push_str("Default");
        Self {
            kind: ProfileKind::RemoteUnit,
            name,
            sources: [AnalogSource::None; NUM_AXES],
            deadzone: [0; NUM_AXES],
            buddy_ports: [None; NUM_AXES],
            teacher_port: None,
        }
    }
}
