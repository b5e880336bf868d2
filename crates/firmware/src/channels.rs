//! Inter-task communication
//!
//! All channels, signals and liveness counters shared between the
//! joystick unit's tasks. Event queue producers use `try_send` and drop
//! the event when the queue is full; the consumer drains the queue every
//! cycle, so sustained overflow only loses the newest transitions.

use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use joylink_core::config::{ChangeKind, ChangeSink};
use joylink_core::debounce::{BuddyEvent, RotaryEvent};
use portable_atomic::AtomicU32;

use crate::config::EVENT_QUEUE_DEPTH;

/// Buddy button events from the button task to the exchange task.
pub static BUDDY_EVENT_CHANNEL: Channel<ThreadModeRawMutex, BuddyEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Rotary encoder events from the button task to the user interface.
pub static ROTARY_EVENT_CHANNEL: Channel<ThreadModeRawMutex, RotaryEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Raised by the config store after a successful mutation; the exchange
/// task recompiles (or swaps roles) at its next cycle boundary.
pub static CONFIG_RELOAD: Signal<ThreadModeRawMutex, ChangeKind> = Signal::new();

/// Stops the exchange task's cycle until the next reload.
pub static EXCHANGE_TERMINATE: Signal<ThreadModeRawMutex, ()> = Signal::new();

/// Rendezvous for calibration: request a snapshot of the raw axis
/// samples, reply carries them.
pub static RAW_AXES_REQUEST: Signal<ThreadModeRawMutex, ()> = Signal::new();
pub static RAW_AXES_REPLY: Signal<ThreadModeRawMutex, [u16; 4]> = Signal::new();

/// Liveness counters bumped once per task iteration, checked by the
/// supervisor.
pub static BUTTON_TICKS: AtomicU32 = AtomicU32::new(0);
pub static EXCHANGE_TICKS: AtomicU32 = AtomicU32::new(0);

/// Set by the EEPROM driver when the bus fails; the supervisor escalates
/// to a system reset.
pub static STORAGE_FATAL: portable_atomic::AtomicBool = portable_atomic::AtomicBool::new(false);

/// Mirror of the last teacher-mode decision, readable from anywhere.
pub static TEACHER_MODE_ACTIVE: portable_atomic::AtomicBool =
    portable_atomic::AtomicBool::new(false);

/// Forwards config store notifications onto the reload signal.
pub struct ReloadNotifier;

impl ChangeSink for ReloadNotifier {
    fn notify(&self, change: ChangeKind) {
        CONFIG_RELOAD.signal(change);
    }
}
