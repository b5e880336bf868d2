//! Frame exchange task (joystick unit, link master)
//!
//! Runs one exchange cycle every 4 ms: sample the axes, fold in buddy
//! events, send the frame over SPI while the remote is sensed present and
//! integrate the reply. Configuration changes are honored only at cycle
//! boundaries via the reload/terminate signals.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel as AdcChannel};
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;

use joylink_core::config::ChangeKind;
use joylink_core::exchange::ExchangeState;
use joylink_core::link::FRAME_LEN;
use joylink_core::switches::LedColor;

use crate::channels::{
    BUDDY_EVENT_CHANNEL, CONFIG_RELOAD, EXCHANGE_TERMINATE, EXCHANGE_TICKS, RAW_AXES_REPLY,
    RAW_AXES_REQUEST, TEACHER_MODE_ACTIVE,
};
use crate::config::EXCHANGE_PERIOD_MS;
use crate::storage::CONFIG;

/// Everything the exchange task owns on the board.
pub struct ExchangeHardware {
    pub spi: Spi<'static, SPI0, Blocking>,
    pub cs: Output<'static>,
    pub adc: Adc<'static, Async>,
    pub axes: [AdcChannel<'static>; 4],
    pub remote_sense: Input<'static>,
    pub vbus_sense: Input<'static>,
    pub leds_green: [Output<'static>; 4],
    pub leds_red: [Output<'static>; 4],
}

fn drive_leds(hw: &mut ExchangeHardware, leds: &[LedColor; 4]) {
    for i in 0..4 {
        match leds[i] {
            LedColor::Off => {
                hw.leds_green[i].set_low();
                hw.leds_red[i].set_low();
            }
            LedColor::Green => {
                hw.leds_green[i].set_high();
                hw.leds_red[i].set_low();
            }
            LedColor::Red => {
                hw.leds_green[i].set_low();
                hw.leds_red[i].set_high();
            }
        }
    }
}

#[embassy_executor::task]
pub async fn exchange_task(mut hw: ExchangeHardware) {
    info!("Exchange task started");

    let mut ex = {
        let guard = CONFIG.lock().await;
        match guard.as_ref() {
            Some(store) => ExchangeState::new(store.global(), store.active_profile()),
            None => {
                error!("Exchange task started without a config store");
                return;
            }
        }
    };

    let mut raw = [2047u16; 4];
    let mut usb_powered = hw.vbus_sense.is_high();
    let mut running = true;
    let receiver = BUDDY_EVENT_CHANNEL.receiver();

    loop {
        if EXCHANGE_TERMINATE.try_take().is_some() {
            ex.reset_outputs();
            drive_leds(&mut hw, &ex.leds);
            while receiver.try_receive().is_ok() {}
            running = false;
            info!("Exchange cycle suspended");
        }

        if let Some(change) = CONFIG_RELOAD.try_take() {
            let guard = CONFIG.lock().await;
            if let Some(store) = guard.as_ref() {
                ex.reload(store.global(), store.active_profile());
            }
            // Events queued under the old configuration are stale.
            while receiver.try_receive().is_ok() {}
            running = true;
            match change {
                ChangeKind::RoleSwitch => info!("Profile role changed, cycle restarted"),
                ChangeKind::Content => debug!("Configuration recompiled"),
            }
        }

        if running {
            for (slot, ch) in raw.iter_mut().zip(hw.axes.iter_mut()) {
                // A failed conversion keeps the previous sample.
                if let Ok(v) = hw.adc.read(ch).await {
                    *slot = v;
                }
            }

            if RAW_AXES_REQUEST.try_take().is_some() {
                RAW_AXES_REPLY.signal(raw);
            }

            let events = core::iter::from_fn(|| receiver.try_receive().ok());
            let tx = ex.run_cycle(raw, events);
            TEACHER_MODE_ACTIVE.store(ex.teacher_mode_active(), Ordering::Relaxed);

            if hw.remote_sense.is_high() {
                let mut rx = [0u8; FRAME_LEN];
                hw.cs.set_low();
                let result = hw.spi.blocking_transfer(&mut rx, &tx);
                hw.cs.set_high();
                match result {
                    Ok(()) => {
                        if !ex.integrate_reply(&rx) {
                            debug!("Reply failed its checksum, keeping previous remote state");
                        }
                    }
                    Err(_) => warn!("Link transfer failed"),
                }
            }

            drive_leds(&mut hw, &ex.leds);
        }

        let vbus = hw.vbus_sense.is_high();
        if vbus != usb_powered {
            usb_powered = vbus;
            info!("USB power {}", if vbus { "connected" } else { "removed" });
        }

        EXCHANGE_TICKS.fetch_add(1, Ordering::Relaxed);
        Timer::after(Duration::from_millis(EXCHANGE_PERIOD_MS)).await;
    }
}

/// Snapshot of the raw axis samples, for calibration front ends. Blocks
/// until the exchange task services the request.
pub async fn get_raw_axes() -> [u16; 4] {
    RAW_AXES_REQUEST.signal(());
    RAW_AXES_REPLY.wait().await
}

/// Whether the teacher switch currently overrides local control.
pub fn is_teacher_mode_active() -> bool {
    TEACHER_MODE_ACTIVE.load(Ordering::Relaxed)
}
