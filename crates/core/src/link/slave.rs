//! Slave side of the link
//!
//! The remote unit has no SPI peripheral on these pins, so the slave end
//! is an explicit state machine polled against the raw lines: wait for the
//! select line, then shift 80 bits LSB-first, driving the outgoing line
//! when the clock is low and sampling the incoming line on the rising
//! edge. A wall-clock deadline bounds the whole transfer.

use super::frame::{validate, FRAME_LEN};
use crate::time::Clock;

/// Outcome of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// 10 bytes exchanged and the received checksum verified.
    Ok,
    /// Deselected mid-frame, deadline hit mid-frame, or bad checksum.
    Error,
    /// The master never selected us before the deadline.
    NotAvailable,
}

/// Raw link lines as seen by the slave.
pub trait LinkPins {
    fn select_active(&self) -> bool;
    fn clock_high(&self) -> bool;
    fn data_in(&self) -> bool;
    fn set_data_out(&mut self, high: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitRisingClock,
    WaitFallingClock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitForSelect,
    Bit { index: u8, phase: Phase },
    Done,
}

/// One in-flight frame exchange. Create it with the frame to send, then
/// poll it until it reports an outcome; the received frame is valid only
/// after `LinkStatus::Ok`.
pub struct SlaveTransfer {
    state: State,
    tx: [u8; FRAME_LEN],
    rx: [u8; FRAME_LEN],
    deadline_ms: u64,
}

const TOTAL_BITS: u8 = (FRAME_LEN * 8) as u8;

impl SlaveTransfer {
    pub fn new<C: Clock>(tx: [u8; FRAME_LEN], clock: &C, timeout_ms: u64) -> Self {
        Self {
            state: State::WaitForSelect,
            tx,
            rx: [0; FRAME_LEN],
            deadline_ms: clock.now_ms() + timeout_ms,
        }
    }

    pub fn received(&self) -> &[u8; FRAME_LEN] {
        &self.rx
    }

    fn tx_bit(&self, index: u8) -> bool {
        self.tx[usize::from(index) / 8] & (1 << (index % 8)) != 0
    }

    /// Samples the lines once and advances. Returns `None` while the
    /// transfer is still in progress.
    pub fn poll<P: LinkPins, C: Clock>(&mut self, pins: &mut P, clock: &C) -> Option<LinkStatus> {
        let timed_out = clock.now_ms() > self.deadline_ms;
        match self.state {
            State::WaitForSelect => {
                if pins.select_active() {
                    pins.set_data_out(self.tx_bit(0));
                    self.state = State::Bit {
                        index: 0,
                        phase: Phase::WaitRisingClock,
                    };
                    None
                } else if timed_out {
                    self.state = State::Done;
                    Some(LinkStatus::NotAvailable)
                } else {
                    None
                }
            }
            State::Bit { index, phase } => {
                if !pins.select_active() || timed_out {
                    self.state = State::Done;
                    return Some(LinkStatus::Error);
                }
                match phase {
                    Phase::WaitRisingClock => {
                        if !pins.clock_high() {
                            return None;
                        }
                        if pins.data_in() {
                            self.rx[usize::from(index) / 8] |= 1 << (index % 8);
                        }
                        if index + 1 == TOTAL_BITS {
                            // The master may drop select right after the
                            // final rising edge; finish here.
                            self.state = State::Done;
                            return Some(if validate(&self.rx) {
                                LinkStatus::Ok
                            } else {
                                LinkStatus::Error
                            });
                        }
                        self.state = State::Bit {
                            index,
                            phase: Phase::WaitFallingClock,
                        };
                        None
                    }
                    Phase::WaitFallingClock => {
                        if pins.clock_high() {
                            return None;
                        }
                        pins.set_data_out(self.tx_bit(index + 1));
                        self.state = State::Bit {
                            index: index + 1,
                            phase: Phase::WaitRisingClock,
                        };
                        None
                    }
                }
            }
            State::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::frame::{pack, IoState};
    use crate::time::MockClock;

    #[derive(Default)]
    struct MockPins {
        select: bool,
        clock: bool,
        mosi: bool,
        miso: bool,
    }

    impl LinkPins for MockPins {
        fn select_active(&self) -> bool {
            self.select
        }
        fn clock_high(&self) -> bool {
            self.clock
        }
        fn data_in(&self) -> bool {
            self.mosi
        }
        fn set_data_out(&mut self, high: bool) {
            self.miso = high;
        }
    }

    fn master_frame() -> [u8; FRAME_LEN] {
        let mut s = IoState::default();
        s.analog = [100, 2047, 4095, 333];
        s.digital[3] = false;
        pack(&s)
    }

    fn slave_frame() -> [u8; FRAME_LEN] {
        let mut s = IoState::default();
        s.analog = [4095, 0, 1, 2];
        s.digital[20] = false;
        pack(&s)
    }

    /// Clocks a full 80-bit transfer, acting as the master. Returns what
    /// the master sampled along with the transfer outcome.
    fn run_master(
        transfer: &mut SlaveTransfer,
        pins: &mut MockPins,
        clock: &MockClock,
        master_tx: &[u8; FRAME_LEN],
    ) -> ([u8; FRAME_LEN], Option<LinkStatus>) {
        let mut master_rx = [0u8; FRAME_LEN];
        let mut outcome = None;
        pins.select = true;
        // Select just went active: slave drives bit 0.
        assert_eq!(transfer.poll(pins, clock), None);
        for i in 0..80u32 {
            let byte = (i / 8) as usize;
            let bit = i % 8;
            pins.mosi = master_tx[byte] & (1 << bit) != 0;
            // Rising edge: both sides sample.
            if pins.miso {
                master_rx[byte] |= 1 << bit;
            }
            pins.clock = true;
            outcome = transfer.poll(pins, clock);
            if i < 79 {
                assert_eq!(outcome, None);
                pins.clock = false;
                assert_eq!(transfer.poll(pins, clock), None);
            }
        }
        pins.select = false;
        pins.clock = false;
        (master_rx, outcome)
    }

    #[test]
    fn full_duplex_exchange_completes_ok() {
        let clock = MockClock::new();
        let mut pins = MockPins::default();
        let master_tx = master_frame();
        let slave_tx = slave_frame();
        let mut transfer = SlaveTransfer::new(slave_tx, &clock, 40);

        // Idle lines: still waiting, no outcome.
        assert_eq!(transfer.poll(&mut pins, &clock), None);

        let (master_rx, outcome) = run_master(&mut transfer, &mut pins, &clock, &master_tx);
        assert_eq!(outcome, Some(LinkStatus::Ok));
        assert_eq!(transfer.received(), &master_tx);
        assert_eq!(master_rx, slave_tx);
    }

    #[test]
    fn never_selected_times_out_as_not_available() {
        let clock = MockClock::new();
        let mut pins = MockPins::default();
        let mut transfer = SlaveTransfer::new(slave_frame(), &clock, 40);

        for _ in 0..10 {
            assert_eq!(transfer.poll(&mut pins, &clock), None);
            clock.advance(5);
        }
        assert_eq!(transfer.poll(&mut pins, &clock), Some(LinkStatus::NotAvailable));
    }

    #[test]
    fn deselect_mid_frame_is_an_error() {
        let clock = MockClock::new();
        let mut pins = MockPins::default();
        let mut transfer = SlaveTransfer::new(slave_frame(), &clock, 40);

        pins.select = true;
        assert_eq!(transfer.poll(&mut pins, &clock), None);
        for _ in 0..5 {
            pins.clock = true;
            assert_eq!(transfer.poll(&mut pins, &clock), None);
            pins.clock = false;
            assert_eq!(transfer.poll(&mut pins, &clock), None);
        }
        pins.select = false;
        assert_eq!(transfer.poll(&mut pins, &clock), Some(LinkStatus::Error));
    }

    #[test]
    fn stalled_clock_mid_frame_is_an_error() {
        let clock = MockClock::new();
        let mut pins = MockPins::default();
        let mut transfer = SlaveTransfer::new(slave_frame(), &clock, 40);

        pins.select = true;
        assert_eq!(transfer.poll(&mut pins, &clock), None);
        pins.clock = true;
        assert_eq!(transfer.poll(&mut pins, &clock), None);
        clock.advance(41);
        assert_eq!(transfer.poll(&mut pins, &clock), Some(LinkStatus::Error));
    }

    #[test]
    fn corrupted_master_frame_fails_the_checksum() {
        let clock = MockClock::new();
        let mut pins = MockPins::default();
        let mut corrupted = master_frame();
        corrupted[9] ^= 0x10;
        let mut transfer = SlaveTransfer::new(slave_frame(), &clock, 40);

        let (_, outcome) = run_master(&mut transfer, &mut pins, &clock, &corrupted);
        assert_eq!(outcome, Some(LinkStatus::Error));
    }
}
