//! Profile data model - key→action mappings, system configuration.
//!
//! A profile is a named set of 16 key actions, one per keypad position,
//! plus a display color.  Profiles are loaded from a JSON keymap file
//! (see [`json`]) or fall back to the compiled-in defaults.

pub mod json;

use crate::config::{
    BRIGHTNESS_DEFAULT, DEBOUNCE_TIME_MS, DEFAULT_KEYMAP_NAME, KEYPAD_LAYOUT, KEYS_PER_PROFILE,
    LONG_PRESS_THRESHOLD_MS, MAX_PROFILES,
};
use crate::input::Timing;
use heapless::{String, Vec};

/// HID modifier bitmask values (left-hand side).
pub mod modifiers {
    pub const LCTRL: u8 = 0x01;
    pub const LSHIFT: u8 = 0x02;
    pub const LALT: u8 = 0x04;
    pub const LGUI: u8 = 0x08;
}

/// One key's action, discriminated explicitly.
///
/// The zero keyboard action (no modifiers, no keycode) and the zero
/// consumer code both normalize to `NoOp` at construction, so "does this
/// key do anything" is a variant check rather than a zero-test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    #[default]
    NoOp,
    Keyboard {
        modifiers: u8,
        keycode: u8,
    },
    Consumer {
        code: u16,
    },
}

impl KeyAction {
    /// Keyboard action; all-zero input collapses to `NoOp`.
    pub fn keyboard(modifiers: u8, keycode: u8) -> Self {
        if modifiers == 0 && keycode == 0 {
            KeyAction::NoOp
        } else {
            KeyAction::Keyboard { modifiers, keycode }
        }
    }

    /// Consumer-control action; code 0 collapses to `NoOp`.
    pub fn consumer(code: u16) -> Self {
        if code == 0 {
            KeyAction::NoOp
        } else {
            KeyAction::Consumer { code }
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, KeyAction::NoOp)
    }
}

/// A named set of 16 key actions plus a display color (RGB888).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub name: String<16>,
    pub keys: [KeyAction; KEYS_PER_PROFILE],
    pub color: u32,
}

impl Profile {
    pub const DEFAULT_COLOR: u32 = 0xFF_FF_FF;

    /// Empty profile with the given name (truncated to capacity); all
    /// slots are no-ops.
    pub fn named(name: &str) -> Self {
        let mut n: String<16> = String::new();
        for c in name.chars() {
            if n.push(c).is_err() {
                break;
            }
        }
        Self {
            name: n,
            keys: [KeyAction::NoOp; KEYS_PER_PROFILE],
            color: Self::DEFAULT_COLOR,
        }
    }
}

/// Resolve a keypad character to its profile slot index.
///
/// Slot order follows the physical layout row-major ('1'..'A', '4'..'B',
/// '7'..'C', '*'..'D'), not ASCII order.
pub fn key_index(key: char) -> Option<usize> {
    KEYPAD_LAYOUT.chars().position(|c| c == key)
}

/// Compiled-in default profiles, used when no keymap file is available.
pub fn default_profiles() -> Vec<Profile, MAX_PROFILES> {
    use crate::hid::keyboard::keycodes;

    let mut dev = Profile::named("DEV");
    dev.keys[0] = KeyAction::keyboard(modifiers::LCTRL, keycodes::KEY_X); // cut
    dev.keys[1] = KeyAction::keyboard(modifiers::LCTRL, keycodes::KEY_C); // copy
    dev.keys[2] = KeyAction::keyboard(modifiers::LCTRL, keycodes::KEY_V); // paste
    dev.keys[4] = KeyAction::keyboard(modifiers::LCTRL, keycodes::KEY_I);

    let mut meeting = Profile::named("MEETING");
    meeting.keys[0] =
        KeyAction::keyboard(modifiers::LCTRL | modifiers::LSHIFT, keycodes::KEY_M); // mic mute
    meeting.keys[1] =
        KeyAction::keyboard(modifiers::LCTRL | modifiers::LSHIFT, keycodes::KEY_O); // video

    let mut profiles = Vec::new();
    let _ = profiles.push(dev);
    let _ = profiles.push(meeting);
    profiles
}

/// Process-wide device settings, loaded once at boot and persisted on
/// explicit save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemConfig {
    pub current_profile: u8,
    pub brightness: u8,
    pub debounce_ms: u8,
    pub long_press_ms: u16,
    pub keymap_name: String<31>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut name: String<31> = String::new();
        let _ = name.push_str(DEFAULT_KEYMAP_NAME);
        Self {
            current_profile: 0,
            brightness: BRIGHTNESS_DEFAULT,
            debounce_ms: DEBOUNCE_TIME_MS,
            long_press_ms: LONG_PRESS_THRESHOLD_MS,
            keymap_name: name,
        }
    }
}

/// Serialized size upper bound: 6 fixed bytes + keymap name.
pub const CONFIG_BLOB_MAX: usize = 6 + 31;

impl SystemConfig {
    /// Input timing derived from the configured debounce and long-press
    /// values.
    pub fn timing(&self) -> Timing {
        Timing {
            debounce_ms: self.debounce_ms as u64,
            long_press_ms: self.long_press_ms as u64,
        }
    }

    /// Serialize to bytes for the key-value store.
    ///
    /// Format: `[profile, brightness, debounce, long_lo, long_hi,
    /// name_len, name...]`.  Returns the number of bytes written, or 0 if
    /// the buffer is too small.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let name = self.keymap_name.as_bytes();
        let total = 6 + name.len();
        if buf.len() < total {
            return 0;
        }
        buf[0] = self.current_profile;
        buf[1] = self.brightness;
        buf[2] = self.debounce_ms;
        buf[3..5].copy_from_slice(&self.long_press_ms.to_le_bytes());
        buf[5] = name.len() as u8;
        buf[6..total].copy_from_slice(name);
        total
    }

    /// Deserialize from bytes.  A short or inconsistent blob yields
    /// `None`; callers fall back to defaults.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }
        let name_len = data[5] as usize;
        if data.len() < 6 + name_len {
            return None;
        }

        let mut name: String<31> = String::new();
        if let Ok(s) = core::str::from_utf8(&data[6..6 + name_len]) {
            for c in s.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
        }
        if name.is_empty() {
            let _ = name.push_str(DEFAULT_KEYMAP_NAME);
        }

        Some(Self {
            current_profile: data[0],
            brightness: data[1],
            debounce_ms: data[2],
            long_press_ms: u16::from_le_bytes([data[3], data[4]]),
            keymap_name: name,
        })
    }
}
