//! User interface subsystem - OLED screens and refresh pacing.
//!
//! The controller decides *which* screen to show; this module names the
//! screens and paces how often the display is redrawn.  The actual
//! SSD1306 drawing lives in [`display`] and only builds for hardware.

#[cfg(feature = "embedded")]
pub mod display;

use crate::config::DISPLAY_REFRESH_MS;

/// Screens (views) the display can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Boot self-test summary.
    Post,
    /// Boot splash (name + firmware version).
    Splash,
    /// Active profile and link status.
    Normal,
    /// Profile selection list.
    Menu,
    /// Device settings editor.
    Settings,
}

/// Rows of the settings screen, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingItem {
    Brightness,
    Debounce,
    LongPress,
    Keymap,
    Reset,
    Save,
    Back,
}

impl SettingItem {
    pub const ALL: [SettingItem; 7] = [
        SettingItem::Brightness,
        SettingItem::Debounce,
        SettingItem::LongPress,
        SettingItem::Keymap,
        SettingItem::Reset,
        SettingItem::Save,
        SettingItem::Back,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingItem::Brightness => "Brightness",
            SettingItem::Debounce => "Debounce",
            SettingItem::LongPress => "Long press",
            SettingItem::Keymap => "Keymap",
            SettingItem::Reset => "Factory reset",
            SettingItem::Save => "Save",
            SettingItem::Back => "Back",
        }
    }
}

/// Rate limiter for display redraws (~30 Hz), decoupled from the input
/// poll rate.  A pending render request survives until the gate opens.
pub struct RefreshGate {
    last_refresh_ms: u64,
    pending: Option<Screen>,
}

impl RefreshGate {
    pub const fn new() -> Self {
        Self {
            last_refresh_ms: 0,
            pending: None,
        }
    }

    /// Queue a render request.  A newer request replaces an older one
    /// that has not been drawn yet.
    pub fn request(&mut self, screen: Screen) {
        self.pending = Some(screen);
    }

    /// If a request is pending and the refresh window has elapsed,
    /// return the screen to draw and start a new window.
    pub fn due(&mut self, now_ms: u64) -> Option<Screen> {
        self.pending?;
        if now_ms.saturating_sub(self.last_refresh_ms) < DISPLAY_REFRESH_MS {
            return None;
        }
        self.last_refresh_ms = now_ms;
        self.pending.take()
    }
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_request_means_never_due() {
        let mut gate = RefreshGate::new();
        assert_eq!(gate.due(1_000_000), None);
    }

    #[test]
    fn request_survives_until_window_opens() {
        let mut gate = RefreshGate::new();
        assert_eq!(gate.due(100), None);
        gate.request(Screen::Menu);
        // First request after boot draws immediately (window long past).
        assert_eq!(gate.due(100), Some(Screen::Menu));

        gate.request(Screen::Normal);
        // Inside the 33 ms window: held.
        assert_eq!(gate.due(110), None);
        assert_eq!(gate.due(120), None);
        // Window elapsed: drawn once, then quiescent.
        assert_eq!(gate.due(140), Some(Screen::Normal));
        assert_eq!(gate.due(200), None);
    }

    #[test]
    fn newer_request_replaces_pending() {
        let mut gate = RefreshGate::new();
        gate.due(0);
        gate.request(Screen::Menu);
        gate.request(Screen::Settings);
        assert_eq!(gate.due(50), Some(Screen::Settings));
    }
}
