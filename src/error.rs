//! Unified error type for the macropad firmware.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! Most runtime conditions are deliberately *not* errors: a key with no
//! mapping, a debounce rejection, or a malformed profile entry are silent
//! no-ops per the device's behavior model.  This type covers the hardware
//! and transport failures that POST and the polling loop report.

use defmt::Format;

/// Top-level error type used across the embedded modules.
#[derive(Debug, Format)]
pub enum Error {
    // USB
    /// USB stack returned an error.
    Usb,

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    /// Persisted keymap blob was present but unparseable.
    KeymapCorrupt,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,

    /// Bounded wait expired (POST hardware checks).
    Timeout,
}
