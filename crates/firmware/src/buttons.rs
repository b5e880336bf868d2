//! Button and encoder polling task (joystick unit)
//!
//! Polls the four buddy buttons and the rotary encoder group every 2 ms,
//! runs the debounce state machines from `joylink-core` and publishes the
//! resulting events. All inputs are active-low with pull-ups.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;

use joylink_core::debounce::{buddy_event, rotary_event, BuddyButton, DebounceChannel};

use crate::channels::{BUDDY_EVENT_CHANNEL, BUTTON_TICKS, ROTARY_EVENT_CHANNEL};
use crate::config::{BUDDY_HOLD_MS, BUTTON_POLL_MS, ENCODER_HOLD_MS};
use crate::UptimeClock;

#[embassy_executor::task]
pub async fn button_task(
    buddies: [Input<'static>; 4],
    phase1: Input<'static>,
    phase2: Input<'static>,
    push: Input<'static>,
) {
    info!("Button task started");

    let clock = UptimeClock;
    let mut buddy_channels = [
        DebounceChannel::new(BUDDY_HOLD_MS),
        DebounceChannel::new(BUDDY_HOLD_MS),
        DebounceChannel::new(BUDDY_HOLD_MS),
        DebounceChannel::new(BUDDY_HOLD_MS),
    ];
    let mut phase1_channel = DebounceChannel::new(ENCODER_HOLD_MS);
    let mut phase2_channel = DebounceChannel::new(ENCODER_HOLD_MS);
    let mut push_channel = DebounceChannel::new(ENCODER_HOLD_MS);

    let buddy_sender = BUDDY_EVENT_CHANNEL.sender();
    let rotary_sender = ROTARY_EVENT_CHANNEL.sender();

    loop {
        for (button, (channel, pin)) in
            BuddyButton::ALL.into_iter().zip(buddy_channels.iter_mut().zip(buddies.iter()))
        {
            let state = channel.poll(pin.is_high(), &clock);
            if let Some(event) = buddy_event(button, state) {
                debug!("Buddy event: {}", event);
                if buddy_sender.try_send(event).is_err() {
                    warn!("Buddy event queue full, dropping {}", event);
                }
            }
        }

        let p1 = phase1_channel.poll(phase1.is_high(), &clock);
        let p2 = phase2_channel.poll(phase2.is_high(), &clock);
        let pb = push_channel.poll(push.is_high(), &clock);
        if let Some(event) = rotary_event(p1, p2, pb) {
            debug!("Rotary event: {}", event);
            if rotary_sender.try_send(event).is_err() {
                warn!("Rotary event queue full, dropping {}", event);
            }
        }

        BUTTON_TICKS.fetch_add(1, Ordering::Relaxed);
        Timer::after(Duration::from_millis(BUTTON_POLL_MS)).await;
    }
}
