//! Input subsystem - keypad matrix, rotary encoder, encoder button.
//!
//! Raw hardware levels are sampled once per loop tick and fed to
//! [`InputPoller::poll`], which debounces and classifies them into at most
//! one [`InputEvent`] per tick.  The poller is pure logic over a
//! [`RawSample`] snapshot, so the whole event model runs in host tests
//! with synthetic samples and clocks.

pub mod encoder;
pub mod matrix;
#[cfg(feature = "embedded")]
pub mod scan;

use encoder::{ButtonPress, DetentTracker, EncoderButton, Rotation};
use matrix::KeyDebounce;

/// A normalized input event, produced once per poll and consumed
/// immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// A keypad key went down (fire-once; releases are not events).
    KeyPress(char),
    EncoderCw,
    EncoderCcw,
    EncoderShortPress,
    EncoderLongPress,
}

/// Raw hardware levels captured at the top of a loop tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawSample {
    /// Key newly reported down by the matrix scan this tick, if any.
    pub key: Option<char>,
    /// Running quadrature count from the encoder decoder.
    pub encoder_count: i32,
    /// Encoder push-button level (true = pressed).
    pub button_down: bool,
    /// Sample timestamp in milliseconds.
    pub now_ms: u64,
}

/// Runtime input timing, sourced from `SystemConfig`.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub debounce_ms: u64,
    pub long_press_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce_ms: crate::config::DEBOUNCE_TIME_MS as u64,
            long_press_ms: crate::config::LONG_PRESS_THRESHOLD_MS as u64,
        }
    }
}

/// Debounces and classifies raw samples into input events.
pub struct InputPoller {
    keypad: KeyDebounce,
    detents: DetentTracker,
    button: EncoderButton,
}

impl InputPoller {
    pub const fn new() -> Self {
        Self {
            keypad: KeyDebounce::new(),
            detents: DetentTracker::new(),
            button: EncoderButton::new(),
        }
    }

    /// Classify one sample.  At most one event is returned per call.
    ///
    /// Stage order is key press, then rotation, then button.  When an
    /// earlier stage fires, the later stages are not consumed this tick:
    /// a pending detent change or button edge stays observable in the
    /// underlying levels and surfaces on the next poll, giving key
    /// presses priority without losing encoder activity.
    pub fn poll(&mut self, sample: &RawSample, timing: &Timing) -> Option<InputEvent> {
        if let Some(key) = sample.key {
            if self.keypad.accept(sample.now_ms, timing.debounce_ms) {
                return Some(InputEvent::KeyPress(key));
            }
            // Debounce rejection is transient noise, not an error; fall
            // through so encoder activity is not starved.
        }

        if let Some(dir) = self.detents.step(sample.encoder_count) {
            return Some(match dir {
                Rotation::Clockwise => InputEvent::EncoderCw,
                Rotation::CounterClockwise => InputEvent::EncoderCcw,
            });
        }

        match self
            .button
            .step(sample.button_down, sample.now_ms, timing.long_press_ms)
        {
            Some(ButtonPress::Short) => Some(InputEvent::EncoderShortPress),
            Some(ButtonPress::Long) => Some(InputEvent::EncoderLongPress),
            None => None,
        }
    }
}

impl Default for InputPoller {
    fn default() -> Self {
        Self::new()
    }
}
