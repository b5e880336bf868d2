//! JoyLink firmware for RP2040
//!
//! Embassy-based firmware pair for the two-unit manual control device:
//! the joystick unit (link master, `src/bin/joystick.rs`) and the remote
//! I/O unit (link slave, `src/bin/remote.rs`).
//!
//! ## Architecture
//! - **Async**: Embassy executor, one task per concern
//! - **Channels**: bounded event queues between the button and exchange
//!   tasks, signals for configuration reload
//! - **Shared logic**: everything testable lives in `joylink-core`; this
//!   crate only binds it to pins, buses and timers

#![no_std]

use embassy_rp::adc::InterruptHandler;
use embassy_rp::bind_interrupts;
use embassy_time::Instant;
use joylink_core::time::Clock;

pub mod buttons;
pub mod channels;
pub mod config;
pub mod exchange;
pub mod remote_io;
pub mod storage;
pub mod supervisor;

// ADC interrupt binding - shared by both binaries
bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => InterruptHandler;
});

/// Millisecond clock backed by the Embassy uptime.
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
