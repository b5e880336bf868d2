//! JoyLink remote unit (link slave)
//!
//! Entry point for the remote I/O unit: answers the master's frame
//! exchange, drives the output stages from received frames and reports
//! its own telemetry back. While no master is on the link the unit runs
//! standalone as a plain analog pass-through.
//!
//! Hardware: Raspberry Pi Pico (RP2040)

#![no_std]
#![no_main]

use cortex_m::peripheral::SCB;
use defmt::*;
use defmt_rtt as _; // global logger
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use panic_halt as _;

use joylink_core::link::{pack, unpack, LinkStatus, SlaveTransfer};
use joylink_firmware::config::{
    MAX_LINK_ERRORS, SLAVE_TRANSFER_TIMEOUT_MS, WATCHDOG_TIMEOUT_MS,
};
use joylink_firmware::remote_io::{RemoteIo, SlaveLinkPins};
use joylink_firmware::{Irqs, UptimeClock};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("========================================");
    info!("JoyLink remote unit");
    info!("Hardware: RP2040 (Raspberry Pi Pico)");
    info!("========================================");

    let p = embassy_rp::init(Default::default());

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));

    let mut pins = SlaveLinkPins {
        select: Input::new(p.PIN_17, Pull::Up),
        clock: Input::new(p.PIN_18, Pull::Down),
        data_in: Input::new(p.PIN_19, Pull::Down),
        data_out: Output::new(p.PIN_16, Level::Low),
    };

    let mut digital: Vec<Flex<'static>, 24> = Vec::new();
    // The wired subset of the 24 frame channels, in channel order.
    for mut pin in [
        Flex::new(p.PIN_0),
        Flex::new(p.PIN_1),
        Flex::new(p.PIN_2),
        Flex::new(p.PIN_3),
        Flex::new(p.PIN_4),
        Flex::new(p.PIN_5),
        Flex::new(p.PIN_6),
        Flex::new(p.PIN_7),
        Flex::new(p.PIN_8),
        Flex::new(p.PIN_9),
        Flex::new(p.PIN_10),
        Flex::new(p.PIN_11),
        Flex::new(p.PIN_12),
        Flex::new(p.PIN_13),
    ] {
        pin.set_pull(Pull::Up);
        let _ = digital.push(pin);
    }

    let mut pwm_cfg = PwmConfig::default();
    pwm_cfg.top = 4095;
    pwm_cfg.compare_a = 2047;
    let pwm_cfgs = [
        pwm_cfg.clone(),
        pwm_cfg.clone(),
        pwm_cfg.clone(),
        pwm_cfg.clone(),
    ];
    let analog_out = [
        Pwm::new_output_a(p.PWM_SLICE7, p.PIN_14, pwm_cfg.clone()),
        Pwm::new_output_a(p.PWM_SLICE2, p.PIN_20, pwm_cfg.clone()),
        Pwm::new_output_a(p.PWM_SLICE3, p.PIN_22, pwm_cfg.clone()),
        Pwm::new_output_a(p.PWM_SLICE4, p.PIN_24, pwm_cfg.clone()),
    ];

    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let telemetry = [
        AdcChannel::new_pin(p.PIN_26, Pull::None),
        AdcChannel::new_pin(p.PIN_27, Pull::None),
        AdcChannel::new_pin(p.PIN_28, Pull::None),
        AdcChannel::new_pin(p.PIN_29, Pull::None),
    ];

    let mut io = RemoteIo::new(digital, analog_out, pwm_cfgs, adc, telemetry);
    let clock = UptimeClock;
    let mut connected = false;
    let mut errors: u32 = 0;

    info!("JoyLink remote unit ready");

    loop {
        watchdog.feed();

        let telemetry = io.sample().await;
        let mut transfer = SlaveTransfer::new(pack(&telemetry), &clock, SLAVE_TRANSFER_TIMEOUT_MS);
        let status = loop {
            if let Some(status) = transfer.poll(&mut pins, &clock) {
                break status;
            }
        };

        match status {
            LinkStatus::Ok => {
                if !connected {
                    info!("Master connected");
                }
                connected = true;
                errors = 0;
                io.apply(&unpack(transfer.received()));
            }
            LinkStatus::NotAvailable => {
                if connected {
                    errors += 1;
                } else {
                    io.pass_through().await;
                }
            }
            LinkStatus::Error => {
                errors += 1;
                if errors == 1 {
                    warn!("Link transfer failed");
                }
            }
        }

        if errors > MAX_LINK_ERRORS {
            error!("Master lost, releasing outputs and resetting");
            io.release_all();
            SCB::sys_reset();
        }

        // Give the executor a breather between transfer windows.
        Timer::after(Duration::from_micros(200)).await;
    }
}
