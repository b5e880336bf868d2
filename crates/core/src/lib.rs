//! JoyLink core - shared logic for the joystick/remote control pair
//!
//! This crate holds the hardware-agnostic half of the JoyLink firmware:
//! debouncing, configuration storage, switch emulation, axis calibration
//! and the link-layer framing used between the two units.
//!
//! ## Architecture
//! - **No hardware here**: time, persistent storage and link pins are
//!   traits, implemented by the firmware crate on the real peripherals and
//!   by mocks in the test suite.
//! - **Compile, then evaluate**: configuration is resolved into flat
//!   per-cycle data (`exchange::CompiledConfig`) outside the hot loop.
//! - **Integer math**: axis transforms use the same i32 arithmetic on both
//!   units so wire values are reproducible.

#![no_std]

pub mod calib;
pub mod config;
pub mod debounce;
pub mod exchange;
pub mod link;
pub mod switches;
pub mod time;
