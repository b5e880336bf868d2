//! Task supervision and watchdog (joystick unit)
//!
//! Feeds the hardware watchdog every 250 ms and verifies that the button
//! and exchange tasks are still making progress. A stalled task or a
//! fatal storage error stops the feeding and forces a system reset, which
//! also releases every output on the remote side once frames stop.

use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;

use crate::channels::{BUTTON_TICKS, EXCHANGE_TICKS, STORAGE_FATAL};
use crate::config::{
    MIN_BUTTON_TICKS_PER_WINDOW, MIN_EXCHANGE_TICKS_PER_WINDOW, STARTUP_GRACE_WINDOWS,
    SUPERVISOR_PERIOD_MS, WATCHDOG_TIMEOUT_MS,
};

fn system_reset() -> ! {
    SCB::sys_reset();
}

#[embassy_executor::task]
pub async fn supervisor_task(mut watchdog: Watchdog) {
    info!("Supervisor task started");
    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));

    let mut windows: u32 = 0;
    let mut last_button = BUTTON_TICKS.load(Ordering::Relaxed);
    let mut last_exchange = EXCHANGE_TICKS.load(Ordering::Relaxed);

    loop {
        Timer::after(Duration::from_millis(SUPERVISOR_PERIOD_MS)).await;

        if STORAGE_FATAL.load(Ordering::Relaxed) {
            error!("Fatal storage error, resetting");
            system_reset();
        }

        let button = BUTTON_TICKS.load(Ordering::Relaxed);
        let exchange = EXCHANGE_TICKS.load(Ordering::Relaxed);
        let button_delta = button.wrapping_sub(last_button);
        let exchange_delta = exchange.wrapping_sub(last_exchange);
        last_button = button;
        last_exchange = exchange;

        windows = windows.saturating_add(1);
        if windows <= STARTUP_GRACE_WINDOWS {
            watchdog.feed();
            continue;
        }

        if button_delta < MIN_BUTTON_TICKS_PER_WINDOW {
            error!("Button task stalled ({} ticks), resetting", button_delta);
            system_reset();
        }
        if exchange_delta < MIN_EXCHANGE_TICKS_PER_WINDOW {
            error!("Exchange task stalled ({} ticks), resetting", exchange_delta);
            system_reset();
        }

        watchdog.feed();
    }
}
