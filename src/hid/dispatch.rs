//! Maps keypad presses to HID reports via the active profile.

use super::{consumer::ConsumerReport, keyboard::KeyboardReport, HidReport, HidSink};
use crate::profile::{key_index, KeyAction, Profile};

/// Resolve a keypad character against the profile.  No-op slots and
/// characters outside the layout yield `None`.
pub fn action_for(profile: &Profile, key: char) -> Option<HidReport> {
    let slot = key_index(key)?;
    match profile.keys[slot] {
        KeyAction::NoOp => None,
        KeyAction::Keyboard { modifiers, keycode } => {
            Some(HidReport::Keyboard(KeyboardReport::single(modifiers, keycode)))
        }
        KeyAction::Consumer { code } => Some(HidReport::Consumer(ConsumerReport::new(code))),
    }
}

/// Resolve and send in one step.  Returns `true` if a report was queued.
pub fn dispatch(sink: &mut impl HidSink, profile: &Profile, key: char) -> bool {
    match action_for(profile, key) {
        Some(report) => sink.send(report),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{default_profiles, modifiers};
    use heapless::Vec;

    struct CaptureSink {
        sent: Vec<HidReport, 8>,
    }

    impl CaptureSink {
        fn new() -> Self {
            Self { sent: Vec::new() }
        }
    }

    impl HidSink for CaptureSink {
        fn send(&mut self, report: HidReport) -> bool {
            self.sent.push(report).is_ok()
        }
    }

    #[test]
    fn mapped_key_produces_keyboard_report() {
        let profiles = default_profiles();
        // Slot 1 of DEV is Ctrl+C; key '2' is slot 1.
        let report = action_for(&profiles[0], '2').unwrap();
        assert_eq!(
            report,
            HidReport::Keyboard(KeyboardReport::single(modifiers::LCTRL, 0x06))
        );
    }

    #[test]
    fn unmapped_key_produces_nothing() {
        let profiles = default_profiles();
        assert_eq!(action_for(&profiles[0], 'D'), None);
        // Not in the layout at all.
        assert_eq!(action_for(&profiles[0], 'z'), None);
    }

    #[test]
    fn consumer_action_produces_consumer_report() {
        let mut p = Profile::named("MEDIA");
        p.keys[0] = KeyAction::consumer(crate::hid::consumer::usages::VOLUME_UP);
        assert_eq!(
            action_for(&p, '1'),
            Some(HidReport::Consumer(ConsumerReport::new(0x00E9)))
        );
    }

    #[test]
    fn dispatch_sends_only_for_mapped_keys() {
        let profiles = default_profiles();
        let mut sink = CaptureSink::new();
        assert!(dispatch(&mut sink, &profiles[0], '1'));
        assert!(!dispatch(&mut sink, &profiles[0], 'D'));
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn release_is_all_zero_for_either_page() {
        let kb = HidReport::Keyboard(KeyboardReport::single(0x01, 0x1B));
        let mut buf = [0xFFu8; 8];
        kb.release().serialize(&mut buf);
        assert_eq!(buf, [0u8; 8]);

        let con = HidReport::Consumer(ConsumerReport::new(0x00E9));
        let mut buf = [0xFFu8; 2];
        con.release().serialize(&mut buf);
        assert_eq!(buf, [0u8; 2]);
    }
}
