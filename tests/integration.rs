//! End-to-end scenarios over the host-testable firmware logic:
//! keymap JSON in, input samples through the poller and mode machine,
//! HID report bytes out.

use macropad::app::post::PostResults;
use macropad::app::{AppController, AppState};
use macropad::config::SPLASH_DURATION_MS;
use macropad::hid::{HidReport, HidSink};
use macropad::input::{InputEvent, InputPoller, RawSample};
use macropad::profile::{default_profiles, json, SystemConfig};

struct CaptureSink {
    sent: Vec<HidReport>,
}

impl CaptureSink {
    fn new() -> Self {
        Self { sent: Vec::new() }
    }
}

impl HidSink for CaptureSink {
    fn send(&mut self, report: HidReport) -> bool {
        self.sent.push(report);
        true
    }
}

/// Drives the poller and controller with synthetic samples on a fake
/// clock, the way the firmware's 10 ms loop does.
struct Harness {
    ctrl: AppController,
    poller: InputPoller,
    sink: CaptureSink,
    now_ms: u64,
}

impl Harness {
    fn boot(keymap: &[u8]) -> Self {
        let mut profiles = heapless::Vec::new();
        if json::parse_keymap(keymap, &mut profiles) == 0 {
            profiles = default_profiles();
        }
        let mut ctrl = AppController::new(SystemConfig::default(), profiles);
        ctrl.finish_post(PostResults::default(), 0);
        ctrl.tick(SPLASH_DURATION_MS);

        Self {
            ctrl,
            poller: InputPoller::new(),
            sink: CaptureSink::new(),
            now_ms: SPLASH_DURATION_MS,
        }
    }

    fn step(&mut self, key: Option<char>, encoder_count: i32, button_down: bool) -> Option<InputEvent> {
        self.now_ms += 10;
        let sample = RawSample {
            key,
            encoder_count,
            button_down,
            now_ms: self.now_ms,
        };
        let timing = self.ctrl.config().timing();
        let event = self.poller.poll(&sample, &timing);
        if let Some(event) = event {
            self.ctrl.handle_event(event, &mut self.sink);
        }
        event
    }

    /// Keep the button held until the long press fires.
    fn idle_for_button_hold(&mut self) {
        for _ in 0..200 {
            if self.step(None, 0, true) == Some(InputEvent::EncoderLongPress) {
                return;
            }
        }
        panic!("long press never fired");
    }

    fn sent_bytes(&self, idx: usize) -> Vec<u8> {
        let mut buf = [0u8; 8];
        let n = self.sent(idx).serialize(&mut buf);
        buf[..n].to_vec()
    }

    fn sent(&self, idx: usize) -> &HidReport {
        &self.sink.sent[idx]
    }
}

#[test]
fn keymap_key_press_produces_exact_report_bytes() {
    let keymap = br#"{"profiles": [{"name": "EDIT", "keys": [
        {"key": "0x1B", "modifiers": ["CTRL"]},
        {"consumer": "0x00CD"}
    ]}]}"#;

    let mut h = Harness::boot(keymap);

    h.step(Some('1'), 0, false);
    assert_eq!(h.sent_bytes(0), [0x01, 0x00, 0x1B, 0x00, 0x00, 0x00, 0x00, 0x00]);

    h.step(Some('2'), 0, false);
    assert_eq!(h.sent_bytes(1), [0xCD, 0x00]);

    // Unmapped key: nothing goes out.
    h.step(Some('D'), 0, false);
    assert_eq!(h.sink.sent.len(), 2);
}

#[test]
fn bouncing_key_sends_one_report() {
    let mut h = Harness::boot(b"");

    // Three raw transitions of the same key inside the 10 ms debounce
    // window are one press.  The harness advances 10 ms per step, so
    // widen the window first.
    h.ctrl = {
        let mut cfg = SystemConfig::default();
        cfg.debounce_ms = 50;
        let mut ctrl = AppController::new(cfg, default_profiles());
        ctrl.finish_post(PostResults::default(), 0);
        ctrl.tick(SPLASH_DURATION_MS);
        ctrl
    };

    h.step(Some('1'), 0, false);
    h.step(Some('1'), 0, false);
    h.step(Some('1'), 0, false);
    assert_eq!(h.sink.sent.len(), 1);
}

#[test]
fn profile_switch_changes_dispatched_action() {
    let mut h = Harness::boot(b"");

    // DEV profile: key '1' is Ctrl+X.
    h.step(Some('1'), 0, false);
    assert_eq!(h.sent_bytes(0), [0x01, 0x00, 0x1B, 0x00, 0x00, 0x00, 0x00, 0x00]);

    // Hold the encoder button to the long-press threshold.
    h.step(None, 0, true);
    h.idle_for_button_hold();
    assert_eq!(h.ctrl.state(), AppState::Menu);

    // Release, move to MEETING, commit.
    h.step(None, 0, false);
    h.step(None, 4, false);
    h.step(None, 4, true);
    let ev = h.step(None, 4, false);
    assert_eq!(ev, Some(InputEvent::EncoderShortPress));
    assert_eq!(h.ctrl.state(), AppState::Normal);
    assert_eq!(h.ctrl.active_profile().unwrap().name.as_str(), "MEETING");

    // Same key now sends Ctrl+Shift+M.
    let before = h.sink.sent.len();
    h.step(Some('1'), 0, false);
    assert_eq!(
        h.sent_bytes(before),
        [0x03, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn volume_knob_works_in_normal_mode() {
    let mut h = Harness::boot(b"");

    h.step(None, 4, false);
    h.step(None, 8, false);
    h.step(None, 4, false);
    h.step(None, 4, true);
    h.step(None, 4, false); // short press: mute

    assert_eq!(h.sent_bytes(0), [0xE9, 0x00]); // volume up
    assert_eq!(h.sent_bytes(1), [0xE9, 0x00]);
    assert_eq!(h.sent_bytes(2), [0xEA, 0x00]); // volume down
    assert_eq!(h.sent_bytes(3), [0xE2, 0x00]); // mute
}

#[test]
fn splash_period_swallows_input() {
    let keymap = b"";
    let mut profiles = heapless::Vec::new();
    if json::parse_keymap(keymap, &mut profiles) == 0 {
        profiles = default_profiles();
    }
    let mut ctrl = AppController::new(SystemConfig::default(), profiles);
    ctrl.finish_post(PostResults::default(), 0);

    let mut sink = CaptureSink::new();
    let step = ctrl.handle_event(InputEvent::KeyPress('1'), &mut sink);
    assert_eq!(step.render, None);
    assert!(sink.sent.is_empty());

    // After the splash duration the same press dispatches.
    assert!(ctrl.tick(SPLASH_DURATION_MS).is_some());
    ctrl.handle_event(InputEvent::KeyPress('1'), &mut sink);
    assert_eq!(sink.sent.len(), 1);
}
