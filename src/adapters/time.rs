//! Monotonic time adapter.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (µs since boot).
//! - **other targets**: `std::time::Instant`.
//!
//! Sleeps are `async-io-mini` reactor timers, so a sleeping task costs
//! nothing and the executor services the other tasks meanwhile.

use core::future::Future;
use core::time::Duration;

use crate::app::ports::TimePort;

pub struct MonotonicTime {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the high-resolution timer counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the adapter was created (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl TimePort for MonotonicTime {
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        async move {
            async_io_mini::Timer::after(duration).await;
        }
    }
}
