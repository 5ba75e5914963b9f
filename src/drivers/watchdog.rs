//! Task watchdog.
//!
//! On ESP-IDF the runtime thread is subscribed to the TWDT so a wedged
//! executor resets the board.  On host the handle only counts feeds.

#[cfg(not(target_os = "espidf"))]
use core::cell::Cell;
use core::time::Duration;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset, ESP_OK,
};

pub struct TaskWatchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: Cell<u32>,
}

impl TaskWatchdog {
    /// Subscribe the calling task with the given reset timeout.
    pub fn subscribe(timeout: Duration) -> Self {
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI on the current task handle.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK as i32 {
                log::warn!("TWDT: reconfigure rc={} (already running?)", ret);
            }
            // SAFETY: a null handle subscribes the calling task.
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK as i32;
            if subscribed {
                log::info!("TWDT: runtime task subscribed, {}ms", timeout_ms);
            } else {
                log::warn!("TWDT: subscribe failed rc={}", ret);
            }
            Self { subscribed }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::debug!("TWDT(sim): {}ms, feeds counted only", timeout_ms);
            Self { feeds: Cell::new(0) }
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the calling task.
            unsafe {
                esp_task_wdt_reset();
            }
        }

        #[cfg(not(target_os = "espidf"))]
        self.feeds.set(self.feeds.get().saturating_add(1));
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }
}
