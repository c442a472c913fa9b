//! Power-on self test bookkeeping.
//!
//! The boot sequence probes each peripheral and records the outcome
//! here.  Interactive checks (press a key, turn the encoder) block with
//! a deadline; [`wait_until`] takes the deadline and the clock as
//! parameters so the waits run against fake clocks in tests.

/// Outcome flags for the boot-time self test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PostResults {
    pub i2c: bool,
    pub display: bool,
    pub usb: bool,
    pub storage: bool,
    pub keypad: bool,
    pub encoder: bool,
    pub button: bool,
}

impl PostResults {
    pub fn all_passed(&self) -> bool {
        self.i2c
            && self.display
            && self.usb
            && self.storage
            && self.keypad
            && self.encoder
            && self.button
    }
}

/// Poll `condition` until it holds or the clock reaches `deadline_ms`.
///
/// Returns `true` if the condition was observed before the deadline.
/// The condition is checked once per clock read, so the caller's clock
/// closure controls the polling cadence.
pub fn wait_until(
    deadline_ms: u64,
    mut now_fn: impl FnMut() -> u64,
    mut condition: impl FnMut() -> bool,
) -> bool {
    loop {
        if condition() {
            return true;
        }
        if now_fn() >= deadline_ms {
            return false;
        }
    }
}
