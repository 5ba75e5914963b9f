//! Manual override buttons.
//!
//! ## Hardware
//!
//! Momentary switch on a GPIO input.  Pull-up with active-low is the
//! usual wiring, but both the bias and the active level come from the
//! button's configuration.
//!
//! [`ManualButton`] is a stateless level reader.  Edge detection and
//! debounce live in [`Debouncer`], one instance per button, owned by the
//! button-poll task.

use core::cell::RefCell;

use crate::app::ports::DigitalInput;
use crate::config::Level;

pub struct ManualButton {
    id: String,
    gpio: u8,
    target: String,
    active_level: Level,
    line: RefCell<Box<dyn DigitalInput>>,
}

impl ManualButton {
    pub fn new(
        id: impl Into<String>,
        gpio: u8,
        target: impl Into<String>,
        active_level: Level,
        line: Box<dyn DigitalInput>,
    ) -> Self {
        Self {
            id: id.into(),
            gpio,
            target: target.into(),
            active_level,
            line: RefCell::new(line),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    /// Id of the actuator this button toggles.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `true` while the input reads the configured active level.
    pub fn is_pressed(&self) -> bool {
        self.line.borrow_mut().is_high() == self.active_level.is_high()
    }
}

impl core::fmt::Debug for ManualButton {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualButton")
            .field("id", &self.id)
            .field("gpio", &self.gpio)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Per-button debounce state.
///
/// A level change is accepted only if at least `window_ms` has passed
/// since the previous accepted change.  [`update`](Self::update) reports
/// accepted released→pressed edges; holding the button reports nothing.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    pressed: bool,
    last_transition_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(window_ms: u32) -> Self {
        Self { window_ms: u64::from(window_ms), pressed: false, last_transition_ms: None }
    }

    /// Feed one sample.  Returns `true` on an accepted press edge.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> bool {
        if pressed == self.pressed {
            return false;
        }
        if let Some(last) = self.last_transition_ms {
            if now_ms.saturating_sub(last) < self.window_ms {
                return false;
            }
        }
        self.pressed = pressed;
        self.last_transition_ms = Some(now_ms);
        pressed
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}
