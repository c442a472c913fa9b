//! Keymap file parsing and serialization (JSON, no_std).
//!
//! Format, one document per named keymap:
//!
//! ```json
//! {"profiles": [{"name": "DEV", "color": 16777215,
//!                "keys": [{"key": "0x1B", "modifiers": ["CTRL"]},
//!                         {"consumer": "0x00E9"}]}]}
//! ```
//!
//! Parsing is tolerant per-profile: an entry missing its required "name"
//! or "keys" field is skipped and the load continues.  A syntactically
//! broken document yields zero profiles.  Unrecognized modifier names are
//! ignored; invalid hex codes become the no-op action.

use super::{modifiers, KeyAction, Profile};
use crate::config::{KEYS_PER_PROFILE, MAX_PROFILES};
use core::fmt::Write as _;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct KeymapDoc<'a> {
    #[serde(borrow)]
    profiles: Vec<ProfileDoc<'a>, MAX_PROFILES>,
}

#[derive(Deserialize)]
struct ProfileDoc<'a> {
    #[serde(borrow)]
    name: Option<&'a str>,
    color: Option<u32>,
    #[serde(borrow)]
    keys: Option<Vec<KeyDoc<'a>, KEYS_PER_PROFILE>>,
}

#[derive(Deserialize)]
struct KeyDoc<'a> {
    #[serde(borrow)]
    key: Option<&'a str>,
    #[serde(borrow)]
    modifiers: Option<Vec<&'a str, 8>>,
    #[serde(borrow)]
    consumer: Option<&'a str>,
}

/// Parse a keymap document into `out`, replacing its contents.
///
/// Returns the number of profiles successfully parsed (0 on total
/// failure - `out` is left empty in that case).
pub fn parse_keymap(json: &[u8], out: &mut Vec<Profile, MAX_PROFILES>) -> usize {
    out.clear();

    let Ok((doc, _)) = serde_json_core::de::from_slice::<KeymapDoc>(json) else {
        return 0;
    };

    for entry in &doc.profiles {
        let (Some(name), Some(keys)) = (entry.name, entry.keys.as_ref()) else {
            // Required field missing - skip this profile, keep the rest.
            continue;
        };

        let mut profile = Profile::named(name);
        if let Some(color) = entry.color {
            profile.color = color;
        }

        // Valid key entries fill slots sequentially; an entry that names
        // neither "key" nor "consumer" does not occupy a slot.
        let mut slot = 0;
        for key in keys {
            if slot >= KEYS_PER_PROFILE {
                break;
            }
            if let Some(action) = shape_action(key) {
                profile.keys[slot] = action;
                slot += 1;
            }
        }

        if out.push(profile).is_err() {
            break;
        }
    }

    out.len()
}

fn shape_action(key: &KeyDoc) -> Option<KeyAction> {
    if let Some(consumer) = key.consumer {
        return Some(KeyAction::consumer(parse_hex_u16(consumer)));
    }

    if let Some(code) = key.key {
        let mut mods = 0u8;
        if let Some(names) = &key.modifiers {
            for name in names {
                mods |= modifier_bit(name);
            }
        }
        return Some(KeyAction::keyboard(mods, parse_hex_u8(code)));
    }

    None
}

fn modifier_bit(name: &str) -> u8 {
    match name {
        "CTRL" => modifiers::LCTRL,
        "SHIFT" => modifiers::LSHIFT,
        "ALT" => modifiers::LALT,
        "GUI" => modifiers::LGUI,
        // Unrecognized names are ignored, not an error.
        _ => 0,
    }
}

/// Parse a hex code with optional "0x"/"0X" prefix; invalid input yields 0.
pub fn parse_hex_u16(s: &str) -> u16 {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).unwrap_or(0)
}

/// Parse a hex keycode with optional "0x"/"0X" prefix; invalid input
/// yields 0 (the no-op keycode).
pub fn parse_hex_u8(s: &str) -> u8 {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).unwrap_or(0)
}

#[derive(Serialize)]
struct KeymapDocOut<'a> {
    profiles: Vec<ProfileOut<'a>, MAX_PROFILES>,
}

#[derive(Serialize)]
struct ProfileOut<'a> {
    name: &'a str,
    color: u32,
    keys: Vec<KeyOut, KEYS_PER_PROFILE>,
}

#[derive(Serialize)]
struct KeyOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String<8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modifiers: Option<Vec<&'static str, 4>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consumer: Option<String<8>>,
}

/// Serialize profiles into `buf` as a keymap document.
///
/// Every profile emits all 16 key slots (no-ops as `"key": "0x00"`) so
/// slot positions survive the sequential reload.  Returns the number of
/// bytes written, or `None` if the buffer is too small.
pub fn serialize_keymap(profiles: &[Profile], buf: &mut [u8]) -> Option<usize> {
    let mut doc = KeymapDocOut {
        profiles: Vec::new(),
    };

    for profile in profiles.iter().take(MAX_PROFILES) {
        let mut keys: Vec<KeyOut, KEYS_PER_PROFILE> = Vec::new();
        for action in &profile.keys {
            let _ = keys.push(key_out(action));
        }
        let _ = doc.profiles.push(ProfileOut {
            name: profile.name.as_str(),
            color: profile.color,
            keys,
        });
    }

    serde_json_core::ser::to_slice(&doc, buf).ok()
}

fn key_out(action: &KeyAction) -> KeyOut {
    let mut out = KeyOut {
        key: None,
        modifiers: None,
        consumer: None,
    };

    match *action {
        KeyAction::NoOp => {
            out.key = Some(hex_u8(0));
        }
        KeyAction::Keyboard { modifiers: m, keycode } => {
            out.key = Some(hex_u8(keycode));
            if m != 0 {
                out.modifiers = Some(modifier_names(m));
            }
        }
        KeyAction::Consumer { code } => {
            out.consumer = Some(hex_u16(code));
        }
    }

    out
}

fn modifier_names(mods: u8) -> Vec<&'static str, 4> {
    let mut names = Vec::new();
    if mods & modifiers::LCTRL != 0 {
        let _ = names.push("CTRL");
    }
    if mods & modifiers::LSHIFT != 0 {
        let _ = names.push("SHIFT");
    }
    if mods & modifiers::LALT != 0 {
        let _ = names.push("ALT");
    }
    if mods & modifiers::LGUI != 0 {
        let _ = names.push("GUI");
    }
    names
}

fn hex_u8(v: u8) -> String<8> {
    let mut s = String::new();
    let _ = write!(s, "0x{v:02X}");
    s
}

fn hex_u16(v: u16) -> String<8> {
    let mut s = String::new();
    let _ = write!(s, "0x{v:04X}");
    s
}
