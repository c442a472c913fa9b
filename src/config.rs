//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Input timing

/// Main loop / input poll cadence (ms). ~100 Hz.
pub const INPUT_POLL_MS: u64 = 10;

/// Default keypad debounce window (ms). Runtime-configurable via
/// `SystemConfig::debounce_ms`.
pub const DEBOUNCE_TIME_MS: u8 = 10;

/// Default encoder-button long-press threshold (ms). Runtime-configurable
/// via `SystemConfig::long_press_ms`.
pub const LONG_PRESS_THRESHOLD_MS: u16 = 1000;

/// Raw quadrature counts per mechanical detent.
pub const ENCODER_DETENT_COUNTS: i32 = 4;

// Keypad layout

/// Key characters in slot order (row-major over the physical 4x4 matrix).
///
/// Slot index 0..16 is the order profiles store their key actions in, so
/// this string is the single source of truth for key→slot resolution.
pub const KEYPAD_LAYOUT: &str = "123A456B789C*0#D";

/// Matrix dimensions.
pub const KEYPAD_ROWS: usize = 4;
pub const KEYPAD_COLS: usize = 4;

// Display

/// Minimum interval between display refreshes (ms). ~30 FPS.
pub const DISPLAY_REFRESH_MS: u64 = 33;

/// Duration of the boot splash screen (ms).
pub const SPLASH_DURATION_MS: u64 = 2000;

/// Default display brightness (SSD1306 contrast).
pub const BRIGHTNESS_DEFAULT: u8 = 128;

// Profiles

/// Maximum number of profiles held in memory / per keymap file.
pub const MAX_PROFILES: usize = 8;

/// Key slots per profile (one per keypad position).
pub const KEYS_PER_PROFILE: usize = 16;

/// Maximum size of a keymap JSON document (bytes).  Sized for the worst
/// case: 8 profiles x 16 keys, every key carrying all four modifiers,
/// serializes to just under 8 KB.
pub const MAX_KEYMAP_JSON: usize = 8192;

/// Largest keymap blob accepted for flash storage (bytes).  A stored
/// item must fit a single 4 KB flash page together with its map
/// headers, so this sits below the page size.
pub const MAX_KEYMAP_ITEM: usize = 4000;

/// Default keymap name when none is persisted.
pub const DEFAULT_KEYMAP_NAME: &str = "default";

// Status / connectivity

/// Status LED blink period half-cycle (ms).
pub const STATUS_UPDATE_MS: u64 = 500;

/// Interval between connectivity reconnect attempts (ms).
pub const LINK_RETRY_MS: u64 = 30_000;

// POST

/// Deadline for each interactive POST hardware wait (ms).
pub const POST_WAIT_MS: u64 = 10_000;

// HID

/// Hold time between a press report and its release report (ms).
pub const HID_PULSE_MS: u64 = 10;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "macropad";
pub const USB_PRODUCT: &str = "Macro Keypad";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Keypad rows     → P0.04, P0.05, P0.06, P0.07
//   Keypad cols     → P0.08, P0.09, P0.10, P0.11
//   Encoder A/B     → P0.12, P0.13
//   Encoder button  → P0.14
//   I²C SDA         → P0.26
//   I²C SCL         → P0.27
//   Status LED RGB  → P0.28, P0.29, P0.30

// Persistent storage

/// Flash page index where config/keymap storage starts (4 KB pages).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for config/keymap storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;

/// Firmware identity shown on the splash screen.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
