//! JoyLink joystick unit (link master)
//!
//! Entry point for the local unit: opens the configuration store on the
//! I2C EEPROM and spawns the button, exchange and supervisor tasks.
//!
//! Hardware: Raspberry Pi Pico (RP2040)
//! Link: SPI0 master, 10-byte frame every 4 ms
//! Storage: I2C EEPROM, 33 x 256 byte image

#![no_std]
#![no_main]

use cortex_m::peripheral::SCB;
use defmt::*;
use defmt_rtt as _; // global logger
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::spi::{self, Spi};
use embassy_rp::watchdog::Watchdog;
use panic_halt as _;

use joylink_core::config::ConfigStore;
use joylink_firmware::buttons::button_task;
use joylink_firmware::channels::ReloadNotifier;
use joylink_firmware::config::{EXCHANGE_PERIOD_MS, LINK_BAUDRATE};
use joylink_firmware::exchange::{exchange_task, ExchangeHardware};
use joylink_firmware::storage::{EepromStorage, CONFIG};
use joylink_firmware::supervisor::supervisor_task;
use joylink_firmware::Irqs;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("========================================");
    info!("JoyLink joystick unit");
    info!("Hardware: RP2040 (Raspberry Pi Pico)");
    info!("Exchange period: {} ms", EXCHANGE_PERIOD_MS);
    info!("========================================");

    let p = embassy_rp::init(Default::default());

    // Configuration store on the I2C EEPROM. Without working storage the
    // unit is not operable; reset and let the watchdog path retry.
    let bus = I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, i2c::Config::default());
    match ConfigStore::open(EepromStorage::new(bus), ReloadNotifier) {
        Ok(store) => {
            info!(
                "Configuration loaded, slot {} active",
                store.current_slot()
            );
            *CONFIG.lock().await = Some(store);
        }
        Err(e) => {
            error!("Configuration storage unusable: {}", e);
            SCB::sys_reset();
        }
    }

    // Link master on SPI0, chip select driven manually around transfers.
    let mut spi_config = spi::Config::default();
    spi_config.frequency = LINK_BAUDRATE;
    let link_spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let link_cs = Output::new(p.PIN_17, Level::High);

    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let axes = [
        AdcChannel::new_pin(p.PIN_26, Pull::None),
        AdcChannel::new_pin(p.PIN_27, Pull::None),
        AdcChannel::new_pin(p.PIN_28, Pull::None),
        AdcChannel::new_pin(p.PIN_29, Pull::None),
    ];

    let hw = ExchangeHardware {
        spi: link_spi,
        cs: link_cs,
        adc,
        axes,
        remote_sense: Input::new(p.PIN_21, Pull::Down),
        vbus_sense: Input::new(p.PIN_24, Pull::None),
        leds_green: [
            Output::new(p.PIN_9, Level::Low),
            Output::new(p.PIN_10, Level::Low),
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_12, Level::Low),
        ],
        leds_red: [
            Output::new(p.PIN_13, Level::Low),
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_15, Level::Low),
            Output::new(p.PIN_20, Level::Low),
        ],
    };

    spawner
        .spawn(button_task(
            [
                Input::new(p.PIN_2, Pull::Up),
                Input::new(p.PIN_3, Pull::Up),
                Input::new(p.PIN_4, Pull::Up),
                Input::new(p.PIN_5, Pull::Up),
            ],
            Input::new(p.PIN_6, Pull::Up),
            Input::new(p.PIN_7, Pull::Up),
            Input::new(p.PIN_8, Pull::Up),
        ))
        .unwrap();
    spawner.spawn(exchange_task(hw)).unwrap();
    spawner
        .spawn(supervisor_task(Watchdog::new(p.WATCHDOG)))
        .unwrap();

    info!("JoyLink joystick unit ready");
}
