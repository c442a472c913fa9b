//! Keypad debounce window.
//!
//! The matrix scanner (hardware side) reports raw press transitions; this
//! gate accepts one only when enough time has passed since the last
//! accepted press.  Releases are never surfaced - the keypad has
//! fire-once-on-press semantics.

/// Time-window debounce over accepted key presses.
pub struct KeyDebounce {
    last_accept_ms: Option<u64>,
}

impl KeyDebounce {
    pub const fn new() -> Self {
        Self {
            last_accept_ms: None,
        }
    }

    /// Returns `true` if a raw press at `now_ms` should be accepted.
    ///
    /// The first press ever is always accepted; after that a press is
    /// rejected while `now - last_accepted < debounce_ms`.
    pub fn accept(&mut self, now_ms: u64, debounce_ms: u64) -> bool {
        if let Some(last) = self.last_accept_ms {
            if now_ms.saturating_sub(last) < debounce_ms {
                return false;
            }
        }
        self.last_accept_ms = Some(now_ms);
        true
    }
}

impl Default for KeyDebounce {
    fn default() -> Self {
        Self::new()
    }
}
