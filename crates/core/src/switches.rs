//! Buddy-button switch emulation
//!
//! Each buddy button emulates the switch configured on its assigned
//! digital port. Presses step latched kinds through their cycle; momentary
//! ports follow the button. The emulated position is then mapped onto the
//! physical output channels (active-low, a sinking driver pulls the line
//! low) and onto the button's bicolor indicator.

use crate::config::SwitchKind;
use crate::debounce::ButtonAction;

/// Emulated position of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchState {
    #[default]
    Off,
    On1,
    On2,
}

/// Bicolor indicator next to each buddy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedColor {
    #[default]
    Off,
    Green,
    Red,
}

/// Steps a switch state by one debounced button event.
pub fn step(state: SwitchState, kind: SwitchKind, action: ButtonAction) -> SwitchState {
    match (kind, action) {
        (SwitchKind::None, _) => state,
        (SwitchKind::TwoPosition, ButtonAction::Pressed) => match state {
            SwitchState::Off => SwitchState::On1,
            _ => SwitchState::Off,
        },
        (SwitchKind::ThreePosition, ButtonAction::Pressed) => match state {
            SwitchState::Off => SwitchState::On1,
            SwitchState::On1 => SwitchState::On2,
            SwitchState::On2 => SwitchState::Off,
        },
        (SwitchKind::MomentaryTwoPosition, ButtonAction::Pressed) => SwitchState::On1,
        (SwitchKind::MomentaryTwoPosition, ButtonAction::Released) => SwitchState::Off,
        // Latched kinds ignore releases.
        (_, ButtonAction::Released) => state,
    }
}

/// Channel levels driven for a switch position, as (ch1, ch2) with `true`
/// meaning line high (inactive).
pub fn drive_levels(state: SwitchState, kind: SwitchKind) -> (bool, bool) {
    match kind {
        SwitchKind::ThreePosition => match state {
            SwitchState::Off => (false, true),
            SwitchState::On1 => (true, true),
            SwitchState::On2 => (true, false),
        },
        _ => match state {
            SwitchState::Off => (true, true),
            _ => (false, true),
        },
    }
}

pub fn indicator(state: SwitchState) -> LedColor {
    match state {
        SwitchState::Off => LedColor::Off,
        SwitchState::On1 => LedColor::Green,
        SwitchState::On2 => LedColor::Red,
    }
}

/// Positions of the four buddy buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuddyBank {
    pub states: [SwitchState; 4],
}

impl BuddyBank {
    /// All switches back to `Off`. Called on profile reload and when the
    /// exchange task starts or stops.
    pub fn reset(&mut self) {
        self.states = [SwitchState::Off; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: SwitchState, kind: SwitchKind) -> SwitchState {
        step(state, kind, ButtonAction::Pressed)
    }

    #[test]
    fn two_position_cycle_closes_after_two_presses() {
        let mut s = SwitchState::Off;
        s = press(s, SwitchKind::TwoPosition);
        assert_eq!(s, SwitchState::On1);
        s = press(s, SwitchKind::TwoPosition);
        assert_eq!(s, SwitchState::Off);
    }

    #[test]
    fn three_position_cycle_closes_after_three_presses() {
        let mut s = SwitchState::Off;
        let expected = [SwitchState::On1, SwitchState::On2, SwitchState::Off];
        for e in expected {
            s = press(s, SwitchKind::ThreePosition);
            assert_eq!(s, e);
        }
    }

    #[test]
    fn latched_kinds_ignore_release() {
        let s = press(SwitchState::Off, SwitchKind::TwoPosition);
        assert_eq!(step(s, SwitchKind::TwoPosition, ButtonAction::Released), s);
        assert_eq!(step(s, SwitchKind::ThreePosition, ButtonAction::Released), s);
    }

    #[test]
    fn momentary_follows_the_button() {
        let s = press(SwitchState::Off, SwitchKind::MomentaryTwoPosition);
        assert_eq!(s, SwitchState::On1);
        assert_eq!(
            step(s, SwitchKind::MomentaryTwoPosition, ButtonAction::Released),
            SwitchState::Off
        );
    }

    #[test]
    fn unconfigured_port_never_moves() {
        for action in [ButtonAction::Pressed, ButtonAction::Released] {
            assert_eq!(step(SwitchState::Off, SwitchKind::None, action), SwitchState::Off);
        }
    }

    #[test]
    fn single_channel_kinds_sink_on_active() {
        assert_eq!(drive_levels(SwitchState::Off, SwitchKind::TwoPosition), (true, true));
        assert_eq!(drive_levels(SwitchState::On1, SwitchKind::TwoPosition), (false, true));
        assert_eq!(
            drive_levels(SwitchState::On1, SwitchKind::MomentaryTwoPosition),
            (false, true)
        );
    }

    // Characterization of the shipped hardware: a three-position port in
    // On1 releases both channels, the same levels a disconnected switch
    // would show. Wired three-position consumers distinguish the positions
    // by which single line is pulled low.
    #[test]
    fn three_position_on1_mapping_pinned() {
        assert_eq!(drive_levels(SwitchState::Off, SwitchKind::ThreePosition), (false, true));
        assert_eq!(drive_levels(SwitchState::On1, SwitchKind::ThreePosition), (true, true));
        assert_eq!(drive_levels(SwitchState::On2, SwitchKind::ThreePosition), (true, false));
    }

    #[test]
    fn indicator_tracks_position() {
        assert_eq!(indicator(SwitchState::Off), LedColor::Off);
        assert_eq!(indicator(SwitchState::On1), LedColor::Green);
        assert_eq!(indicator(SwitchState::On2), LedColor::Red);
    }

    #[test]
    fn bank_reset_returns_all_off() {
        let mut bank = BuddyBank::default();
        bank.states[2] = SwitchState::On2;
        bank.reset();
        assert_eq!(bank.states, [SwitchState::Off; 4]);
    }
}
