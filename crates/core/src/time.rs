//! Millisecond clock abstraction
//!
//! The debounce hold timers and the slave-side link timeouts only need a
//! monotonic millisecond counter. Firmware backs this with the Embassy
//! uptime; tests use [`MockClock`] and advance it explicitly.

/// Monotonic millisecond time source.
pub trait Clock {
    /// Milliseconds since an arbitrary start point. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// Controllable clock for host tests.
#[derive(Default)]
pub struct MockClock {
    now_ms: core::cell::Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}
