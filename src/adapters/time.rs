//! Monotonic clock adapter.
//!
//! The controller works in `u32` milliseconds that wrap after ~49.7 days;
//! every consumer compares times with `wrapping_sub`, so the wrap is
//! harmless.
//!
//! - **`espidf` feature**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **host**: uses `std::time::Instant` for testing and simulation.

/// Source of controller time for adapters that pace themselves.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(feature = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions once the system
        // timer is running, which ESP-IDF guarantees before app_main.
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction.
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Wrapping millisecond timestamp for the controller.
    pub fn now_ms(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        MonotonicClock::now_ms(self)
    }
}
