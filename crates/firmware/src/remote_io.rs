//! Remote unit I/O (link slave)
//!
//! Thin hardware binding for the remote unit: the link lines behind the
//! `LinkPins` trait, the 24 open-drain digital channels, four PWM analog
//! outputs and the analog telemetry inputs. All decisions live in
//! `joylink-core`; this module only moves levels.

use embassy_rp::adc::{Adc, Async, Channel as AdcChannel};
use embassy_rp::gpio::{Flex, Input, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use heapless::Vec;

use joylink_core::link::{IoState, LinkPins};

/// Raw link lines as the slave sees them. Select is active-low.
pub struct SlaveLinkPins {
    pub select: Input<'static>,
    pub clock: Input<'static>,
    pub data_in: Input<'static>,
    pub data_out: Output<'static>,
}

impl LinkPins for SlaveLinkPins {
    fn select_active(&self) -> bool {
        self.select.is_low()
    }

    fn clock_high(&self) -> bool {
        self.clock.is_high()
    }

    fn data_in(&self) -> bool {
        self.data_in.is_high()
    }

    fn set_data_out(&mut self, high: bool) {
        if high {
            self.data_out.set_high();
        } else {
            self.data_out.set_low();
        }
    }
}

/// The remote unit's output stages and telemetry inputs.
pub struct RemoteIo {
    /// Open-drain digital channels: released = input with pull-up,
    /// active = driven low.
    digital: Vec<Flex<'static>, 24>,
    analog_out: [Pwm<'static>; 4],
    pwm_cfg: [PwmConfig; 4],
    adc: Adc<'static, Async>,
    telemetry: [AdcChannel<'static>; 4],
}

impl RemoteIo {
    pub fn new(
        digital: Vec<Flex<'static>, 24>,
        analog_out: [Pwm<'static>; 4],
        pwm_cfg: [PwmConfig; 4],
        adc: Adc<'static, Async>,
        telemetry: [AdcChannel<'static>; 4],
    ) -> Self {
        let mut io = Self {
            digital,
            analog_out,
            pwm_cfg,
            adc,
            telemetry,
        };
        io.release_all();
        io
    }

    /// Releases every digital line and centers the analog outputs.
    pub fn release_all(&mut self) {
        self.apply(&IoState::default());
    }

    /// Drives the output stages from a received frame.
    pub fn apply(&mut self, state: &IoState) {
        for (pin, &high) in self.digital.iter_mut().zip(state.digital.iter()) {
            if high {
                pin.set_as_input();
            } else {
                pin.set_low();
                pin.set_as_output();
            }
        }
        for i in 0..4 {
            self.pwm_cfg[i].compare_a = state.analog[i] & 0x0FFF;
            self.analog_out[i].set_config(&self.pwm_cfg[i]);
        }
    }

    /// Reads the unit's own picture: line levels of the digital channels
    /// and the analog telemetry inputs. This is what the frame sent back
    /// to the joystick unit carries.
    pub async fn sample(&mut self) -> IoState {
        let mut state = IoState::default();
        for (level, pin) in state.digital.iter_mut().zip(self.digital.iter_mut()) {
            *level = pin.is_high();
        }
        for (slot, ch) in state.analog.iter_mut().zip(self.telemetry.iter_mut()) {
            if let Ok(v) = self.adc.read(ch).await {
                *slot = v;
            }
        }
        state
    }

    /// Standalone operation while no master is on the link: analog
    /// telemetry passes straight to the analog outputs, digital channels
    /// stay released.
    pub async fn pass_through(&mut self) {
        let mut state = self.sample().await;
        state.digital = [true; 24];
        self.apply(&state);
    }
}
