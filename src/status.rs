//! Status LED policy and connectivity housekeeping.

use crate::config::{LINK_RETRY_MS, STATUS_UPDATE_MS};

/// Tri-color status LED states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedColor {
    Off,
    /// Self-test failure or link error.
    Red,
    /// Host connected, reports flowing.
    Green,
    /// Ready, waiting for the host (blinking).
    Blue,
}

/// Map device status to an LED color.
///
/// A failed self test pins the LED red.  Otherwise green when the HID
/// link is up, and a blue blink (toggling every [`STATUS_UPDATE_MS`])
/// while waiting for the host.
pub fn status_color(hid_connected: bool, post_ok: bool, now_ms: u64) -> LedColor {
    if !post_ok {
        return LedColor::Red;
    }
    if hid_connected {
        return LedColor::Green;
    }
    if (now_ms / STATUS_UPDATE_MS) % 2 == 0 {
        LedColor::Blue
    } else {
        LedColor::Off
    }
}

/// Gates connectivity retry attempts to a fixed interval.
///
/// Loss of the link is never fatal; the owner asks `should_retry` each
/// tick and re-initiates at most once per [`LINK_RETRY_MS`].
pub struct LinkMonitor {
    last_attempt_ms: Option<u64>,
}

impl LinkMonitor {
    pub const fn new() -> Self {
        Self {
            last_attempt_ms: None,
        }
    }

    /// Returns `true` when a reconnect attempt is due.  While the link
    /// is up the interval is re-armed, so the first attempt after a
    /// drop waits the full interval.
    pub fn should_retry(&mut self, connected: bool, now_ms: u64) -> bool {
        if connected {
            self.last_attempt_ms = Some(now_ms);
            return false;
        }
        match self.last_attempt_ms {
            Some(last) if now_ms.saturating_sub(last) < LINK_RETRY_MS => false,
            _ => {
                self.last_attempt_ms = Some(now_ms);
                true
            }
        }
    }
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
