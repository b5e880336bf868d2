//! Button and rotary encoder debouncing
//!
//! Each physical contact gets a [`DebounceChannel`]: a small state machine
//! that confirms a raw level change over two consecutive polls, reports the
//! edge for exactly one poll, and then blocks further transitions for a
//! per-channel hold time. The joystick unit polls all seven channels (four
//! buddy buttons, two encoder phases, one encoder push button) once every
//! 2 ms from the button task.
//!
//! All inputs are pulled up and switch to ground, so a falling edge is a
//! press and a rising edge is a release.

use crate::time::Clock;

/// Debounced line state reported by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineState {
    Low,
    High,
    /// Low-to-high transition confirmed on this poll.
    RisingEdge,
    /// High-to-low transition confirmed on this poll.
    FallingEdge,
}

impl LineState {
    /// Settled level, with edges mapped to the level they lead into.
    pub fn is_high(self) -> bool {
        matches!(self, LineState::High | LineState::RisingEdge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fsm {
    Low,
    RisingCandidate,
    HighHold,
    High,
    FallingCandidate,
    LowHold,
}

/// Debounce state machine for one contact.
///
/// A transition is valid when the new raw level persists for two
/// consecutive polls; the second poll reports the edge. After an edge the
/// channel holds its new level for `hold_ms` regardless of the raw pin.
pub struct DebounceChannel {
    fsm: Fsm,
    hold_ms: u64,
    deadline_ms: u64,
}

impl DebounceChannel {
    /// Creates a channel settled at the pulled-up (high) level.
    pub fn new(hold_ms: u64) -> Self {
        Self {
            fsm: Fsm::High,
            hold_ms,
            deadline_ms: 0,
        }
    }

    pub fn poll<C: Clock>(&mut self, raw_high: bool, clock: &C) -> LineState {
        let now = clock.now_ms();
        match self.fsm {
            Fsm::Low => {
                if raw_high {
                    self.fsm = Fsm::RisingCandidate;
                }
                LineState::Low
            }
            Fsm::RisingCandidate => {
                if raw_high {
                    self.fsm = Fsm::HighHold;
                    self.deadline_ms = now + self.hold_ms;
                    LineState::RisingEdge
                } else {
                    self.fsm = Fsm::Low;
                    LineState::Low
                }
            }
            Fsm::HighHold => {
                if now > self.deadline_ms {
                    self.fsm = Fsm::High;
                }
                LineState::High
            }
            Fsm::High => {
                if !raw_high {
                    self.fsm = Fsm::FallingCandidate;
                }
                LineState::High
            }
            Fsm::FallingCandidate => {
                if raw_high {
                    self.fsm = Fsm::High;
                    LineState::High
                } else {
                    self.fsm = Fsm::LowHold;
                    self.deadline_ms = now + self.hold_ms;
                    LineState::FallingEdge
                }
            }
            Fsm::LowHold => {
                if now > self.deadline_ms {
                    self.fsm = Fsm::Low;
                }
                LineState::Low
            }
        }
    }
}

/// One of the four buddy buttons on the joystick unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuddyButton {
    B1,
    B2,
    B3,
    B4,
}

impl BuddyButton {
    pub const ALL: [BuddyButton; 4] = [
        BuddyButton::B1,
        BuddyButton::B2,
        BuddyButton::B3,
        BuddyButton::B4,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    Pressed,
    Released,
}

/// Queue message from the button task to the exchange task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuddyEvent {
    pub button: BuddyButton,
    pub action: ButtonAction,
}

/// Queue message from the button task to the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RotaryEvent {
    Pressed,
    Released,
    Clockwise,
    CounterClockwise,
}

/// Maps a debounced buddy-button poll result to an event, if any.
/// Active-low: a falling edge is a press.
pub fn buddy_event(button: BuddyButton, state: LineState) -> Option<BuddyEvent> {
    match state {
        LineState::FallingEdge => Some(BuddyEvent {
            button,
            action: ButtonAction::Pressed,
        }),
        LineState::RisingEdge => Some(BuddyEvent {
            button,
            action: ButtonAction::Released,
        }),
        _ => None,
    }
}

/// Derives a rotary-group event from one poll of its three contacts.
///
/// A confirmed falling edge on phase 1 is a detent: clockwise if phase 2
/// still reads high, counter-clockwise otherwise. A detent in the same poll
/// takes precedence over a push-button event.
pub fn rotary_event(phase1: LineState, phase2: LineState, push: LineState) -> Option<RotaryEvent> {
    let mut event = match push {
        LineState::FallingEdge => Some(RotaryEvent::Pressed),
        LineState::RisingEdge => Some(RotaryEvent::Released),
        _ => None,
    };

    if phase1 == LineState::FallingEdge {
        event = Some(if phase2.is_high() {
            RotaryEvent::Clockwise
        } else {
            RotaryEvent::CounterClockwise
        });
    }

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockClock;

    const POLL_MS: u64 = 2;

    fn poll_seq(ch: &mut DebounceChannel, clock: &MockClock, raws: &[bool]) -> LineState {
        let mut last = LineState::High;
        for &raw in raws {
            clock.advance(POLL_MS);
            last = ch.poll(raw, clock);
        }
        last
    }

    #[test]
    fn single_press_reports_one_falling_edge() {
        let clock = MockClock::new();
        let mut ch = DebounceChannel::new(50);

        assert_eq!(ch.poll(true, &clock), LineState::High);
        clock.advance(POLL_MS);
        // First low sample is only a candidate.
        assert_eq!(ch.poll(false, &clock), LineState::High);
        clock.advance(POLL_MS);
        // Second low sample confirms the edge.
        assert_eq!(ch.poll(false, &clock), LineState::FallingEdge);
        clock.advance(POLL_MS);
        // Edge is gone after one poll.
        assert_eq!(ch.poll(false, &clock), LineState::Low);
    }

    #[test]
    fn glitch_shorter_than_two_polls_is_ignored() {
        let clock = MockClock::new();
        let mut ch = DebounceChannel::new(50);

        // One low sample followed by high again: candidate reverses.
        assert_eq!(poll_seq(&mut ch, &clock, &[true, false, true]), LineState::High);
        assert_eq!(ch.poll(true, &clock), LineState::High);
    }

    #[test]
    fn hold_time_blocks_retrigger() {
        let clock = MockClock::new();
        let mut ch = DebounceChannel::new(50);

        poll_seq(&mut ch, &clock, &[false, false]); // confirmed press at t=4ms
        // Bounce back to high well inside the 50ms hold window: no edge,
        // channel stays low.
        for _ in 0..10 {
            clock.advance(POLL_MS);
            assert_eq!(ch.poll(true, &clock), LineState::Low);
        }
        // After the hold expires the release is recognized normally.
        clock.set(100);
        assert_eq!(ch.poll(true, &clock), LineState::Low);
        clock.advance(POLL_MS);
        assert_eq!(ch.poll(true, &clock), LineState::Low); // candidate poll
        clock.advance(POLL_MS);
        assert_eq!(ch.poll(true, &clock), LineState::RisingEdge);
    }

    #[test]
    fn stable_signal_settles_to_final_level() {
        let clock = MockClock::new();
        let mut ch = DebounceChannel::new(50);

        poll_seq(&mut ch, &clock, &[false, false]);
        clock.set(200);
        for _ in 0..5 {
            clock.advance(POLL_MS);
            assert_eq!(ch.poll(false, &clock), LineState::Low);
        }
    }

    #[test]
    fn buddy_events_map_edges_to_press_release() {
        let ev = buddy_event(BuddyButton::B2, LineState::FallingEdge).unwrap();
        assert_eq!(ev.action, ButtonAction::Pressed);
        let ev = buddy_event(BuddyButton::B2, LineState::RisingEdge).unwrap();
        assert_eq!(ev.action, ButtonAction::Released);
        assert!(buddy_event(BuddyButton::B1, LineState::Low).is_none());
        assert!(buddy_event(BuddyButton::B1, LineState::High).is_none());
    }

    #[test]
    fn rotary_direction_from_phase2_level() {
        assert_eq!(
            rotary_event(LineState::FallingEdge, LineState::High, LineState::Low),
            Some(RotaryEvent::Clockwise)
        );
        assert_eq!(
            rotary_event(LineState::FallingEdge, LineState::Low, LineState::Low),
            Some(RotaryEvent::CounterClockwise)
        );
    }

    #[test]
    fn rotary_detent_overrides_push_event() {
        assert_eq!(
            rotary_event(LineState::FallingEdge, LineState::High, LineState::FallingEdge),
            Some(RotaryEvent::Clockwise)
        );
        assert_eq!(
            rotary_event(LineState::Low, LineState::High, LineState::FallingEdge),
            Some(RotaryEvent::Pressed)
        );
        assert_eq!(
            rotary_event(LineState::Low, LineState::High, LineState::RisingEdge),
            Some(RotaryEvent::Released)
        );
        assert_eq!(rotary_event(LineState::Low, LineState::High, LineState::High), None);
    }
}
