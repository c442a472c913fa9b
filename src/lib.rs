//! Macro keypad firmware library.
//!
//! Everything that makes a decision - debouncing, the mode state
//! machine, keymap parsing, report construction - lives here behind
//! plain data types, with timestamps and HID sinks injected, so it all
//! runs under `cargo test` on the host.  The hardware-facing modules
//! (GPIO scanning, SSD1306, flash, USB) are gated behind the `embedded`
//! feature and used only by the binary in `main.rs`.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod hid;
pub mod input;
pub mod profile;
pub mod status;
pub mod ui;

#[cfg(feature = "embedded")]
pub mod error;
#[cfg(feature = "embedded")]
pub mod storage;
#[cfg(feature = "embedded")]
pub mod usb;

#[cfg(test)]
mod tests {
    //! Cross-module scenarios: raw samples in, HID bytes out.

    use crate::app::post::PostResults;
    use crate::app::{AppController, AppState};
    use crate::config::{MAX_PROFILES, SPLASH_DURATION_MS};
    use crate::hid::{HidReport, HidSink};
    use crate::input::{InputPoller, RawSample, Timing};
    use crate::profile::{json, Profile, SystemConfig};
    use heapless::Vec;

    struct CaptureSink {
        sent: std::vec::Vec<HidReport>,
    }

    impl CaptureSink {
        fn new() -> Self {
            Self { sent: std::vec::Vec::new() }
        }
    }

    impl HidSink for CaptureSink {
        fn send(&mut self, report: HidReport) -> bool {
            self.sent.push(report);
            true
        }
    }

    fn boot_controller(profiles: Vec<Profile, MAX_PROFILES>) -> AppController {
        let mut ctrl = AppController::new(SystemConfig::default(), profiles);
        ctrl.finish_post(PostResults::default(), 0);
        ctrl.tick(SPLASH_DURATION_MS);
        ctrl
    }

    #[test]
    fn keymap_file_to_hid_bytes() {
        // A keymap from flash drives a key press all the way to the
        // exact bytes the USB endpoint would carry.
        let keymap = br#"{"profiles": [{"name": "TEST", "keys": [
            {"key": "0x1B", "modifiers": ["CTRL"]}
        ]}]}"#;

        let mut profiles = Vec::new();
        assert_eq!(json::parse_keymap(keymap, &mut profiles), 1);

        let mut ctrl = boot_controller(profiles);
        let mut sink = CaptureSink::new();
        let mut poller = InputPoller::new();
        let timing = ctrl.config().timing();

        let sample = RawSample {
            key: Some('1'),
            encoder_count: 0,
            button_down: false,
            now_ms: SPLASH_DURATION_MS + 10,
        };
        let event = poller.poll(&sample, &timing).unwrap();
        ctrl.handle_event(event, &mut sink);

        assert_eq!(sink.sent.len(), 1);
        let mut buf = [0u8; 8];
        assert_eq!(sink.sent[0].serialize(&mut buf), 8);
        assert_eq!(buf, [0x01, 0x00, 0x1B, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn long_hold_switches_profile_without_stray_reports() {
        // Hold the encoder button past the threshold: the menu opens at
        // the crossing, the release emits nothing, and no HID report
        // leaves the device during the whole exchange.
        let mut ctrl = boot_controller(crate::profile::default_profiles());
        let mut sink = CaptureSink::new();
        let mut poller = InputPoller::new();
        let timing = ctrl.config().timing();
        let t0 = SPLASH_DURATION_MS;

        let mut feed = |key, button, now_ms, poller: &mut InputPoller| {
            let sample = RawSample {
                key,
                encoder_count: 0,
                button_down: button,
                now_ms,
            };
            poller.poll(&sample, &timing)
        };

        assert_eq!(feed(None, true, t0, &mut poller), None);
        let event = feed(None, true, t0 + 1000, &mut poller).unwrap();
        let step = ctrl.handle_event(event, &mut sink);
        assert_eq!(ctrl.state(), AppState::Menu);
        assert!(step.render.is_some());

        // Release of the same hold is silent.
        assert_eq!(feed(None, false, t0 + 1100, &mut poller), None);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn debounce_uses_configured_window() {
        let mut cfg = SystemConfig::default();
        cfg.debounce_ms = 50;
        let timing = cfg.timing();
        let mut poller = InputPoller::new();

        let press = |now_ms| RawSample {
            key: Some('7'),
            encoder_count: 0,
            button_down: false,
            now_ms,
        };
        assert!(poller.poll(&press(0), &timing).is_some());
        assert!(poller.poll(&press(30), &timing).is_none());
        assert!(poller.poll(&press(50), &timing).is_some());
    }
}
