//! Rotary encoder detent tracking and button press classification.

use crate::config::ENCODER_DETENT_COUNTS;

/// Rotation direction of one recognized detent step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Buckets the raw quadrature count into detents and reports bucket changes.
///
/// The raw count is divided by [`ENCODER_DETENT_COUNTS`] (truncating), so
/// one mechanical click maps to one event regardless of intermediate
/// quadrature states.  A multi-detent jump within one poll still yields a
/// single event; the direction is the sign of the jump.
pub struct DetentTracker {
    last_detent: i32,
}

impl DetentTracker {
    pub const fn new() -> Self {
        Self { last_detent: 0 }
    }

    /// Feed the current raw count; returns a rotation if the detent
    /// bucket changed since the previous call.
    pub fn step(&mut self, raw_count: i32) -> Option<Rotation> {
        let detent = raw_count / ENCODER_DETENT_COUNTS;
        if detent == self.last_detent {
            return None;
        }
        let dir = if detent > self.last_detent {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        };
        self.last_detent = detent;
        Some(dir)
    }
}

impl Default for DetentTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// What the encoder button produced this poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonPress {
    Short,
    Long,
}

/// Level-sampled encoder button with short/long press classification.
///
/// The long press fires once, *while still held*, the moment the elapsed
/// hold time crosses the threshold - the caller can react without waiting
/// for release.  The release of that same hold emits nothing.  A release
/// before the threshold emits a short press.
pub struct EncoderButton {
    down: bool,
    press_start_ms: u64,
    long_fired: bool,
}

impl EncoderButton {
    pub const fn new() -> Self {
        Self {
            down: false,
            press_start_ms: 0,
            long_fired: false,
        }
    }

    /// Feed the sampled button level; returns a press classification when
    /// one completes (short on release, long at threshold crossing).
    pub fn step(&mut self, level_down: bool, now_ms: u64, long_press_ms: u64) -> Option<ButtonPress> {
        if level_down && !self.down {
            // Press edge.
            self.down = true;
            self.press_start_ms = now_ms;
            self.long_fired = false;
            return None;
        }

        if !level_down && self.down {
            // Release edge.
            self.down = false;
            let held = now_ms.saturating_sub(self.press_start_ms);
            if !self.long_fired && held < long_press_ms {
                return Some(ButtonPress::Short);
            }
            return None;
        }

        if self.down && !self.long_fired {
            let held = now_ms.saturating_sub(self.press_start_ms);
            if held >= long_press_ms {
                self.long_fired = true;
                return Some(ButtonPress::Long);
            }
        }

        None
    }
}

impl Default for EncoderButton {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: u64 = 1000;

    #[test]
    fn detent_requires_full_resolution_count() {
        let mut t = DetentTracker::new();
        assert_eq!(t.step(1), None);
        assert_eq!(t.step(3), None);
        assert_eq!(t.step(4), Some(Rotation::Clockwise));
        assert_eq!(t.step(4), None);
    }

    #[test]
    fn detent_direction_follows_sign() {
        let mut t = DetentTracker::new();
        assert_eq!(t.step(4), Some(Rotation::Clockwise));
        assert_eq!(t.step(0), Some(Rotation::CounterClockwise));
        assert_eq!(t.step(-4), Some(Rotation::CounterClockwise));
    }

    #[test]
    fn multi_detent_jump_is_one_event() {
        let mut t = DetentTracker::new();
        assert_eq!(t.step(12), Some(Rotation::Clockwise));
        assert_eq!(t.step(12), None);
    }

    #[test]
    fn short_press_on_release_before_threshold() {
        let mut b = EncoderButton::new();
        assert_eq!(b.step(true, 0, LONG), None);
        assert_eq!(b.step(true, 500, LONG), None);
        assert_eq!(b.step(false, 600, LONG), Some(ButtonPress::Short));
    }

    #[test]
    fn long_press_fires_at_threshold_while_held() {
        let mut b = EncoderButton::new();
        assert_eq!(b.step(true, 0, LONG), None);
        assert_eq!(b.step(true, 999, LONG), None);
        assert_eq!(b.step(true, 1000, LONG), Some(ButtonPress::Long));
        // Still held: no repeat.
        assert_eq!(b.step(true, 1500, LONG), None);
        // Release after a long press is silent.
        assert_eq!(b.step(false, 1600, LONG), None);
    }

    #[test]
    fn next_cycle_after_long_press_is_independent() {
        let mut b = EncoderButton::new();
        b.step(true, 0, LONG);
        assert_eq!(b.step(true, 1000, LONG), Some(ButtonPress::Long));
        b.step(false, 1100, LONG);
        // A fresh press/release starts from scratch.
        assert_eq!(b.step(true, 1200, LONG), None);
        assert_eq!(b.step(false, 1300, LONG), Some(ButtonPress::Short));
    }

    #[test]
    fn release_straddling_threshold_without_crossing_poll_is_silent() {
        // Held sample before the threshold, release sample after it: the
        // hold exceeded the threshold but no poll observed the crossing.
        // Neither a short nor a long press is emitted.
        let mut b = EncoderButton::new();
        b.step(true, 0, LONG);
        assert_eq!(b.step(true, 995, LONG), None);
        assert_eq!(b.step(false, 1005, LONG), None);
    }
}
