//! Exchange cycle
//!
//! The joystick unit runs one cycle per frame exchange: resolve teacher
//! mode from the last remote picture, map local axes and buddy switches
//! onto the outgoing frame, and integrate the reply. Both sides share one
//! merged picture: the accepted reply seeds the next outgoing frame, local
//! sourcing overlays only the channels it owns, so undriven channels echo
//! the remote's own state and an active teacher mode passes the whole
//! picture through untouched. The active profile and global tables are
//! compiled into [`CompiledConfig`] once per configuration change so the
//! cycle itself only indexes flat arrays.

use crate::calib::AxisTransform;
use crate::config::{AnalogSource, GlobalConfig, Profile, SwitchKind, NUM_AXES};
use crate::debounce::BuddyEvent;
use crate::link::{pack, unpack, validate, IoState, FRAME_LEN};
use crate::switches::{drive_levels, indicator, step, BuddyBank, LedColor};

#[derive(Debug, Clone, Copy)]
struct TeacherSense {
    three_position: bool,
    ch1: Option<u8>,
    ch2: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
struct CompiledPort {
    kind: SwitchKind,
    ch1: Option<u8>,
    ch2: Option<u8>,
}

/// Active profile and global tables resolved into per-cycle data.
pub struct CompiledConfig {
    teacher: Option<TeacherSense>,
    buddies: [Option<CompiledPort>; NUM_AXES],
    sources: [AnalogSource; NUM_AXES],
    axis_channels: [u8; NUM_AXES],
    transforms: [AxisTransform; NUM_AXES],
}

impl CompiledConfig {
    pub fn compile(global: &GlobalConfig, profile: &Profile) -> Self {
        let teacher = profile.teacher_port.map(|port| {
            let sw = &global.switches[port as usize];
            TeacherSense {
                three_position: sw.kind == SwitchKind::ThreePosition,
                ch1: sw.ch1,
                ch2: sw.ch2,
            }
        });
        let mut buddies = [None; NUM_AXES];
        for (i, port) in profile.buddy_ports.iter().enumerate() {
            buddies[i] = port.map(|p| {
                let sw = &global.switches[p as usize];
                CompiledPort {
                    kind: sw.kind,
                    ch1: sw.ch1,
                    ch2: sw.ch2,
                }
            });
        }
        // The transform for an output axis pairs the calibration of its
        // local input (if any) with its own output calibration.
        let mut transforms = [AxisTransform::compute(
            &global.input_cal[0],
            &global.output_cal[0],
            0,
        ); NUM_AXES];
        for (axis, t) in transforms.iter_mut().enumerate() {
            if let AnalogSource::Local(n) = profile.sources[axis] {
                *t = AxisTransform::compute(
                    &global.input_cal[n as usize],
                    &global.output_cal[axis],
                    profile.deadzone[n as usize],
                );
            }
        }
        Self {
            teacher,
            buddies,
            sources: profile.sources,
            axis_channels: global.axis_channels,
            transforms,
        }
    }

    /// Teacher mode is sensed on the remote unit's digital channels. A
    /// three-position teacher switch is inactive only in its off position
    /// (ch1 low, ch2 high); any other kind is active while ch1 is low.
    fn teacher_mode_active(&self, remote: &IoState) -> bool {
        let Some(t) = &self.teacher else {
            return false;
        };
        let Some(c1) = t.ch1 else {
            return false;
        };
        let ch1_low = !remote.digital[c1 as usize];
        if t.three_position {
            let ch2_high = t.ch2.map(|c2| remote.digital[c2 as usize]).unwrap_or(false);
            !(ch1_low && ch2_high)
        } else {
            ch1_low
        }
    }
}

/// Everything the exchange task owns between cycles.
pub struct ExchangeState {
    compiled: CompiledConfig,
    bank: BuddyBank,
    /// Outgoing picture: the last accepted reply overlaid with the locally
    /// driven channels. Channels nothing local drives echo the remote's
    /// own state back to it.
    pub local: IoState,
    /// Last good picture received from the remote.
    pub remote: IoState,
    pub leds: [LedColor; NUM_AXES],
}

impl ExchangeState {
    pub fn new(global: &GlobalConfig, profile: &Profile) -> Self {
        Self {
            compiled: CompiledConfig::compile(global, profile),
            bank: BuddyBank::default(),
            local: IoState::default(),
            remote: IoState::default(),
            leds: [LedColor::Off; NUM_AXES],
        }
    }

    /// Recompiles after a configuration change. Switch states do not carry
    /// over into the new profile.
    pub fn reload(&mut self, global: &GlobalConfig, profile: &Profile) {
        self.compiled = CompiledConfig::compile(global, profile);
        self.reset_outputs();
    }

    /// Returns all switches to off and releases every digital line.
    /// Also used when the exchange task shuts down.
    pub fn reset_outputs(&mut self) {
        self.bank.reset();
        self.local = IoState::default();
        self.leds = [LedColor::Off; NUM_AXES];
    }

    pub fn teacher_mode_active(&self) -> bool {
        self.compiled.teacher_mode_active(&self.remote)
    }

    /// Runs one cycle and returns the frame to send. `events` is drained
    /// completely; while teacher mode is active local control is
    /// suspended, the events are discarded and the frame passes the last
    /// accepted remote picture straight back.
    pub fn run_cycle(
        &mut self,
        raw_axes: [u16; NUM_AXES],
        events: impl Iterator<Item = BuddyEvent>,
    ) -> [u8; FRAME_LEN] {
        let teacher_active = self.teacher_mode_active();

        if teacher_active {
            for _ in events {}
        } else {
            self.apply_axes(raw_axes);
            for event in events {
                let i = event.button.index();
                if let Some(port) = &self.compiled.buddies[i] {
                    self.bank.states[i] = step(self.bank.states[i], port.kind, event.action);
                }
            }
            self.drive_switches();
        }

        pack(&self.local)
    }

    fn apply_axes(&mut self, raw_axes: [u16; NUM_AXES]) {
        for axis in 0..NUM_AXES {
            let value = match self.compiled.sources[axis] {
                AnalogSource::None => continue,
                AnalogSource::Local(n) => {
                    self.compiled.transforms[axis].apply(raw_axes[n as usize])
                }
                AnalogSource::Remote(n) => self.remote.analog[n as usize],
            };
            let channel = self.compiled.axis_channels[axis] as usize;
            self.local.analog[channel] = value;
        }
    }

    fn drive_switches(&mut self) {
        for i in 0..NUM_AXES {
            let Some(port) = &self.compiled.buddies[i] else {
                self.leds[i] = LedColor::Off;
                continue;
            };
            let (l1, l2) = drive_levels(self.bank.states[i], port.kind);
            if let Some(c1) = port.ch1 {
                self.local.digital[c1 as usize] = l1;
            }
            if let Some(c2) = port.ch2 {
                self.local.digital[c2 as usize] = l2;
            }
            self.leds[i] = indicator(self.bank.states[i]);
        }
    }

    /// Integrates a received frame; on checksum failure the previous
    /// remote picture is kept and `false` is returned.
    ///
    /// The accepted picture also becomes the base of the next outgoing
    /// frame; `run_cycle` overlays only the locally driven channels.
    pub fn integrate_reply(&mut self, frame: &[u8; FRAME_LEN]) -> bool {
        if !validate(frame) {
            return false;
        }
        let state = unpack(frame);
        self.remote = state;
        self.local = state;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::{BuddyButton, ButtonAction};
    use crate::switches::SwitchState;

    fn default_setup() -> (GlobalConfig, Profile) {
        (GlobalConfig::default(), Profile::default())
    }

    fn event(button: BuddyButton, action: ButtonAction) -> BuddyEvent {
        BuddyEvent { button, action }
    }

    #[test]
    fn default_profile_drives_nothing() {
        let (g, p) = default_setup();
        let mut ex = ExchangeState::new(&g, &p);
        let frame = ex.run_cycle([0, 1000, 2000, 3000], core::iter::empty());
        assert!(validate(&frame));
        assert_eq!(unpack(&frame), IoState::default());
    }

    #[test]
    fn local_source_routes_through_transform_and_channel_map() {
        let (g, mut p) = default_setup();
        p.sources[0] = AnalogSource::Local(1);
        let mut ex = ExchangeState::new(&g, &p);
        ex.run_cycle([0, 3000, 0, 0], core::iter::empty());
        // Output axis 0 drives physical channel 2 (default routing);
        // default calibration is identity.
        assert_eq!(ex.local.analog[2], 3000);
        assert_eq!(ex.local.analog[0], 2047);
    }

    #[test]
    fn remote_source_passes_telemetry_through() {
        let (g, mut p) = default_setup();
        p.sources[1] = AnalogSource::Remote(2);
        let mut ex = ExchangeState::new(&g, &p);
        let mut remote = IoState::default();
        remote.analog[2] = 1234;
        assert!(ex.integrate_reply(&pack(&remote)));
        ex.run_cycle([0; 4], core::iter::empty());
        // Output axis 1 drives physical channel 3 (default routing).
        assert_eq!(ex.local.analog[3], 1234);
    }

    #[test]
    fn momentary_buddy_button_sinks_port_and_lights_green() {
        let (g, mut p) = default_setup();
        // Port 7 is a momentary switch on channel 22 by default.
        p.buddy_ports[0] = Some(7);
        let mut ex = ExchangeState::new(&g, &p);

        ex.run_cycle([0; 4], [event(BuddyButton::B1, ButtonAction::Pressed)].into_iter());
        assert!(!ex.local.digital[22]);
        assert_eq!(ex.leds[0], LedColor::Green);

        ex.run_cycle([0; 4], [event(BuddyButton::B1, ButtonAction::Released)].into_iter());
        assert!(ex.local.digital[22]);
        assert_eq!(ex.leds[0], LedColor::Off);
    }

    #[test]
    fn three_position_buddy_cycles_both_channels() {
        let (g, mut p) = default_setup();
        // Port 0: three-position on channels 14/15.
        p.buddy_ports[2] = Some(0);
        let mut ex = ExchangeState::new(&g, &p);

        let press = [event(BuddyButton::B3, ButtonAction::Pressed)];
        ex.run_cycle([0; 4], press.into_iter());
        assert_eq!(ex.bank.states[2], SwitchState::On1);
        assert!(ex.local.digital[14] && ex.local.digital[15]);
        assert_eq!(ex.leds[2], LedColor::Green);

        ex.run_cycle([0; 4], press.into_iter());
        assert_eq!((ex.local.digital[14], ex.local.digital[15]), (true, false));
        assert_eq!(ex.leds[2], LedColor::Red);

        ex.run_cycle([0; 4], press.into_iter());
        assert_eq!((ex.local.digital[14], ex.local.digital[15]), (false, true));
        assert_eq!(ex.leds[2], LedColor::Off);
    }

    #[test]
    fn three_position_teacher_port_senses_off_position_only() {
        let (g, mut p) = default_setup();
        // Port 0 is three-position on channels 14/15.
        p.teacher_port = Some(0);
        let mut ex = ExchangeState::new(&g, &p);

        let mut remote = IoState::default();
        remote.digital[14] = false;
        remote.digital[15] = true;
        ex.integrate_reply(&pack(&remote));
        assert!(!ex.teacher_mode_active());

        // Any other combination hands control to the teacher side.
        for (d14, d15) in [(true, true), (true, false), (false, false)] {
            remote.digital[14] = d14;
            remote.digital[15] = d15;
            ex.integrate_reply(&pack(&remote));
            assert!(ex.teacher_mode_active(), "({d14}, {d15})");
        }
    }

    #[test]
    fn two_position_teacher_port_is_active_while_low() {
        let (g, mut p) = default_setup();
        // Port 5 is the two-position switch on channel 23.
        p.teacher_port = Some(5);
        let mut ex = ExchangeState::new(&g, &p);
        assert!(!ex.teacher_mode_active());

        let mut remote = IoState::default();
        remote.digital[23] = false;
        ex.integrate_reply(&pack(&remote));
        assert!(ex.teacher_mode_active());
    }

    #[test]
    fn teacher_mode_suspends_local_control() {
        let (g, mut p) = default_setup();
        p.teacher_port = Some(5);
        p.sources[0] = AnalogSource::Local(0);
        p.buddy_ports[0] = Some(7);
        let mut ex = ExchangeState::new(&g, &p);

        let mut remote = IoState::default();
        remote.digital[23] = false;
        ex.integrate_reply(&pack(&remote));

        let frame = ex.run_cycle([4095; 4], [event(BuddyButton::B1, ButtonAction::Pressed)].into_iter());
        let sent = unpack(&frame);
        assert_eq!(sent, remote);
        assert_eq!(ex.bank.states[0], SwitchState::Off);
    }

    #[test]
    fn teacher_mode_passes_remote_state_through() {
        let (g, mut p) = default_setup();
        p.teacher_port = Some(5);
        // Axis 0 drives physical channel 2; without teacher mode this
        // cycle would command 3000 there.
        p.sources[0] = AnalogSource::Local(0);
        let mut ex = ExchangeState::new(&g, &p);

        let mut remote = IoState::default();
        remote.digital[23] = false;
        remote.analog[2] = 1000;
        ex.integrate_reply(&pack(&remote));
        assert!(ex.teacher_mode_active());

        let sent = unpack(&ex.run_cycle([3000; 4], core::iter::empty()));
        assert_eq!(sent.analog[2], 1000);
        assert_eq!(sent, remote);

        // Back in the off position local sourcing takes over again.
        remote.digital[23] = true;
        ex.integrate_reply(&pack(&remote));
        let sent = unpack(&ex.run_cycle([3000; 4], core::iter::empty()));
        assert_eq!(sent.analog[2], 3000);
    }

    #[test]
    fn undriven_channels_echo_the_reply() {
        let (g, p) = default_setup();
        let mut ex = ExchangeState::new(&g, &p);

        let mut remote = IoState::default();
        remote.analog[1] = 555;
        remote.digital[9] = false;
        ex.integrate_reply(&pack(&remote));

        // No sources, buddies or teacher port configured: the whole
        // picture is echoed back unchanged.
        let sent = unpack(&ex.run_cycle([0; 4], core::iter::empty()));
        assert_eq!(sent, remote);
    }

    #[test]
    fn bad_reply_keeps_previous_remote_picture() {
        let (g, p) = default_setup();
        let mut ex = ExchangeState::new(&g, &p);
        let mut remote = IoState::default();
        remote.analog[0] = 777;
        assert!(ex.integrate_reply(&pack(&remote)));

        let mut corrupted = pack(&IoState::default());
        corrupted[2] ^= 0x01;
        assert!(!ex.integrate_reply(&corrupted));
        assert_eq!(ex.remote.analog[0], 777);
    }

    #[test]
    fn reload_resets_switch_states_and_outputs() {
        let (g, mut p) = default_setup();
        p.buddy_ports[0] = Some(7);
        let mut ex = ExchangeState::new(&g, &p);
        ex.run_cycle([0; 4], [event(BuddyButton::B1, ButtonAction::Pressed)].into_iter());
        assert!(!ex.local.digital[22]);

        ex.reload(&g, &p);
        assert_eq!(ex.bank.states[0], SwitchState::Off);
        assert!(ex.local.digital[22]);
        assert_eq!(ex.leds[0], LedColor::Off);
    }
}
