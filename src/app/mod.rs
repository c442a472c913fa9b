//! Application state machine.
//!
//! [`AppController`] owns the mode, the system configuration, the loaded
//! profiles and the self-test results.  The polling loop feeds it one
//! input event at a time; it answers with a [`Step`] saying what (if
//! anything) to redraw and whether the configuration should be
//! persisted.  All of it is pure logic over injected timestamps and a
//! [`HidSink`], so the full mode machine runs in host tests.

pub mod post;

use crate::config::{MAX_PROFILES, SPLASH_DURATION_MS};
use crate::hid::consumer::{usages, ConsumerReport};
use crate::hid::{dispatch, HidReport, HidSink};
use crate::input::InputEvent;
use crate::profile::{default_profiles, Profile, SystemConfig};
use crate::ui::{Screen, SettingItem};
use heapless::Vec;
use post::PostResults;

/// Operating mode.  `PostTest` is boot-only; the splash retires itself
/// into `Normal` after a fixed duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    PostTest,
    Splash,
    Normal,
    Menu,
    Settings,
}

/// Outcome of one controller step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Step {
    /// Screen to redraw, if the visible state changed.
    pub render: Option<Screen>,
    /// The configuration should be written back to flash.
    pub save_config: bool,
    /// The persistent storage should be wiped (factory reset).
    pub factory_reset: bool,
}

impl Step {
    const NONE: Step = Step {
        render: None,
        save_config: false,
        factory_reset: false,
    };

    fn render(screen: Screen) -> Step {
        Step {
            render: Some(screen),
            ..Step::NONE
        }
    }
}

pub struct AppController {
    state: AppState,
    config: SystemConfig,
    profiles: Vec<Profile, MAX_PROFILES>,
    /// Menu selection cursor; snapshot of the active profile on entry.
    menu_cursor: usize,
    setting_cursor: usize,
    post: PostResults,
    splash_until_ms: u64,
}

impl AppController {
    pub fn new(config: SystemConfig, profiles: Vec<Profile, MAX_PROFILES>) -> Self {
        let mut ctrl = Self {
            state: AppState::PostTest,
            config,
            profiles,
            menu_cursor: 0,
            setting_cursor: 0,
            post: PostResults::default(),
            splash_until_ms: 0,
        };
        // A stale profile index from flash must not index out of bounds.
        if ctrl.profiles.is_empty() {
            ctrl.config.current_profile = 0;
        } else if ctrl.config.current_profile as usize >= ctrl.profiles.len() {
            ctrl.config.current_profile = 0;
        }
        ctrl
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn post_results(&self) -> &PostResults {
        &self.post
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles.get(self.config.current_profile as usize)
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn selected_setting(&self) -> SettingItem {
        SettingItem::ALL[self.setting_cursor]
    }

    /// Record the self-test outcome and start the splash.  Returns the
    /// screen to draw (the splash itself).
    pub fn finish_post(&mut self, results: PostResults, now_ms: u64) -> Screen {
        self.post = results;
        self.state = AppState::Splash;
        self.splash_until_ms = now_ms + SPLASH_DURATION_MS;
        Screen::Splash
    }

    /// Time-driven transitions; called every loop tick.  Retires the
    /// splash into `Normal` when its display duration elapses.
    pub fn tick(&mut self, now_ms: u64) -> Option<Screen> {
        if self.state == AppState::Splash && now_ms >= self.splash_until_ms {
            self.state = AppState::Normal;
            return Some(Screen::Normal);
        }
        None
    }

    /// Feed one input event through the mode machine.
    ///
    /// Events with no defined transition in the current state are
    /// no-ops: no render, no save, no report.
    pub fn handle_event(&mut self, event: InputEvent, sink: &mut impl HidSink) -> Step {
        match self.state {
            AppState::PostTest | AppState::Splash => Step::NONE,
            AppState::Normal => self.handle_normal(event, sink),
            AppState::Menu => self.handle_menu(event),
            AppState::Settings => self.handle_settings(event),
        }
    }

    fn handle_normal(&mut self, event: InputEvent, sink: &mut impl HidSink) -> Step {
        match event {
            InputEvent::KeyPress(key) => {
                if let Some(profile) = self.profiles.get(self.config.current_profile as usize) {
                    // Unmapped keys are a silent no-op.
                    let _ = dispatch::dispatch(sink, profile, key);
                }
                Step::NONE
            }
            InputEvent::EncoderCw => {
                sink.send(HidReport::Consumer(ConsumerReport::new(usages::VOLUME_UP)));
                Step::NONE
            }
            InputEvent::EncoderCcw => {
                sink.send(HidReport::Consumer(ConsumerReport::new(usages::VOLUME_DOWN)));
                Step::NONE
            }
            InputEvent::EncoderShortPress => {
                sink.send(HidReport::Consumer(ConsumerReport::new(usages::MUTE)));
                Step::NONE
            }
            InputEvent::EncoderLongPress => {
                self.menu_cursor = self.config.current_profile as usize;
                self.state = AppState::Menu;
                Step::render(Screen::Menu)
            }
        }
    }

    fn handle_menu(&mut self, event: InputEvent) -> Step {
        match event {
            InputEvent::EncoderCw => {
                let max = self.profiles.len().saturating_sub(1);
                if self.menu_cursor < max {
                    self.menu_cursor += 1;
                    Step::render(Screen::Menu)
                } else {
                    // Clamped at the end of the list: nothing changed.
                    Step::NONE
                }
            }
            InputEvent::EncoderCcw => {
                if self.menu_cursor > 0 {
                    self.menu_cursor -= 1;
                    Step::render(Screen::Menu)
                } else {
                    Step::NONE
                }
            }
            InputEvent::EncoderShortPress => {
                self.config.current_profile = self.menu_cursor as u8;
                self.state = AppState::Normal;
                Step {
                    render: Some(Screen::Normal),
                    save_config: true,
                    ..Step::NONE
                }
            }
            InputEvent::EncoderLongPress => {
                // Discard the selection; the active profile is untouched.
                self.state = AppState::Normal;
                Step::render(Screen::Normal)
            }
            InputEvent::KeyPress('#') => {
                self.setting_cursor = 0;
                self.state = AppState::Settings;
                Step::render(Screen::Settings)
            }
            InputEvent::KeyPress(_) => Step::NONE,
        }
    }

    fn handle_settings(&mut self, event: InputEvent) -> Step {
        match event {
            InputEvent::EncoderCw => {
                if self.setting_cursor < SettingItem::ALL.len() - 1 {
                    self.setting_cursor += 1;
                    Step::render(Screen::Settings)
                } else {
                    Step::NONE
                }
            }
            InputEvent::EncoderCcw => {
                if self.setting_cursor > 0 {
                    self.setting_cursor -= 1;
                    Step::render(Screen::Settings)
                } else {
                    Step::NONE
                }
            }
            InputEvent::EncoderShortPress => self.activate_setting(),
            InputEvent::EncoderLongPress => {
                self.state = AppState::Normal;
                Step::render(Screen::Normal)
            }
            InputEvent::KeyPress(_) => Step::NONE,
        }
    }

    fn activate_setting(&mut self) -> Step {
        match SettingItem::ALL[self.setting_cursor] {
            SettingItem::Brightness => {
                self.config.brightness = self.config.brightness.wrapping_add(16);
                Step::render(Screen::Settings)
            }
            SettingItem::Debounce => {
                self.config.debounce_ms = if self.config.debounce_ms >= 50 {
                    5
                } else {
                    self.config.debounce_ms + 5
                };
                Step::render(Screen::Settings)
            }
            SettingItem::LongPress => {
                self.config.long_press_ms = if self.config.long_press_ms >= 2000 {
                    250
                } else {
                    self.config.long_press_ms + 250
                };
                Step::render(Screen::Settings)
            }
            // The keymap row shows the active file; editing it needs a
            // host-side tool, so the press does nothing here.
            SettingItem::Keymap => Step::NONE,
            SettingItem::Reset => {
                // Back to the factory state: default config, built-in
                // profiles.  The caller wipes the flash region.
                self.config = SystemConfig::default();
                self.profiles = default_profiles();
                self.menu_cursor = 0;
                Step {
                    render: Some(Screen::Settings),
                    save_config: false,
                    factory_reset: true,
                }
            }
            SettingItem::Save => Step {
                render: None,
                save_config: true,
                ..Step::NONE
            },
            SettingItem::Back => {
                self.state = AppState::Menu;
                Step::render(Screen::Menu)
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::default_profiles;

    struct CaptureSink {
        sent: Vec<HidReport, 16>,
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

    fn three_profiles() -> Vec<Profile, MAX_PROFILES> {
        let mut profiles = default_profiles();
        let _ = profiles.push(Profile::named("THIRD"));
        profiles
    }

    fn controller_in_normal(profiles: Vec<Profile, MAX_PROFILES>) -> AppController {
        let mut ctrl = AppController::new(SystemConfig::default(), profiles);
        ctrl.finish_post(PostResults::default(), 0);
        ctrl.tick(SPLASH_DURATION_MS);
        ctrl
    }

    #[test]
    fn splash_retires_into_normal_after_duration() {
        let mut ctrl = AppController::new(SystemConfig::default(), default_profiles());
        assert_eq!(ctrl.state(), AppState::PostTest);
        assert_eq!(ctrl.finish_post(PostResults::default(), 100), Screen::Splash);
        assert_eq!(ctrl.state(), AppState::Splash);
        assert_eq!(ctrl.tick(100 + SPLASH_DURATION_MS - 1), None);
        assert_eq!(ctrl.tick(100 + SPLASH_DURATION_MS), Some(Screen::Normal));
        assert_eq!(ctrl.state(), AppState::Normal);
    }

    #[test]
    fn splash_ignores_input() {
        let mut ctrl = AppController::new(SystemConfig::default(), default_profiles());
        ctrl.finish_post(PostResults::default(), 0);
        let mut sink = CaptureSink::new();
        let step = ctrl.handle_event(InputEvent::KeyPress('1'), &mut sink);
        assert_eq!(step, Step::NONE);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn menu_selection_clamps_and_commits() {
        // Long press enters the menu at the active profile; two CW steps
        // clamp at the last profile; short press commits and persists.
        let mut ctrl = controller_in_normal(three_profiles());
        let mut sink = CaptureSink::new();

        let step = ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Menu));
        assert_eq!(ctrl.menu_cursor(), 0);

        assert_eq!(
            ctrl.handle_event(InputEvent::EncoderCw, &mut sink).render,
            Some(Screen::Menu)
        );
        assert_eq!(
            ctrl.handle_event(InputEvent::EncoderCw, &mut sink).render,
            Some(Screen::Menu)
        );
        assert_eq!(ctrl.menu_cursor(), 2);
        // Clamped at the end: no render.
        assert_eq!(ctrl.handle_event(InputEvent::EncoderCw, &mut sink), Step::NONE);
        assert_eq!(ctrl.menu_cursor(), 2);

        let step = ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Normal));
        assert!(step.save_config);
        assert_eq!(ctrl.config().current_profile, 2);
        assert_eq!(ctrl.state(), AppState::Normal);
    }

    #[test]
    fn menu_long_press_discards_selection() {
        let mut ctrl = controller_in_normal(three_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);

        let step = ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Normal));
        assert!(!step.save_config);
        assert_eq!(ctrl.config().current_profile, 0);
    }

    #[test]
    fn normal_key_press_dispatches_via_active_profile() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();

        // '1' is DEV slot 0 = Ctrl+X.
        let step = ctrl.handle_event(InputEvent::KeyPress('1'), &mut sink);
        assert_eq!(step, Step::NONE);
        assert_eq!(sink.sent.len(), 1);

        // 'D' is unmapped: silent no-op.
        ctrl.handle_event(InputEvent::KeyPress('D'), &mut sink);
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn normal_encoder_is_volume_and_mute() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();

        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        ctrl.handle_event(InputEvent::EncoderCcw, &mut sink);
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);

        assert_eq!(
            sink.sent.as_slice(),
            &[
                HidReport::Consumer(ConsumerReport::new(usages::VOLUME_UP)),
                HidReport::Consumer(ConsumerReport::new(usages::VOLUME_DOWN)),
                HidReport::Consumer(ConsumerReport::new(usages::MUTE)),
            ]
        );
    }

    #[test]
    fn settings_entered_from_menu_with_hash_key() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);

        let step = ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);
        assert_eq!(step.render, Some(Screen::Settings));
        assert_eq!(ctrl.state(), AppState::Settings);
        assert_eq!(ctrl.selected_setting(), SettingItem::Brightness);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn settings_adjusts_values_in_place() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);

        // Brightness: 128 + 16.
        let step = ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Settings));
        assert_eq!(ctrl.config().brightness, 144);

        // Move to Debounce and step it from 10 to 15.
        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(ctrl.config().debounce_ms, 15);

        // Move to LongPress and step it from 1000 to 1250.
        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(ctrl.config().long_press_ms, 1250);
    }

    #[test]
    fn settings_values_wrap_at_range_end() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);

        ctrl.config.brightness = 248;
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(ctrl.config().brightness, 8);

        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        ctrl.config.debounce_ms = 50;
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(ctrl.config().debounce_ms, 5);

        ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        ctrl.config.long_press_ms = 2000;
        ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(ctrl.config().long_press_ms, 250);
    }

    #[test]
    fn settings_save_and_exit_paths() {
        let mut ctrl = controller_in_normal(default_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);

        // Cursor clamps at the last item.
        for _ in 0..10 {
            ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        }
        assert_eq!(ctrl.selected_setting(), SettingItem::Back);

        // Back returns to the menu.
        let step = ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Menu));
        assert_eq!(ctrl.state(), AppState::Menu);

        // Re-enter, select Save: flag set, no redraw.
        ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);
        for _ in 0..5 {
            ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        }
        assert_eq!(ctrl.selected_setting(), SettingItem::Save);
        let step = ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert!(step.save_config);
        assert_eq!(step.render, None);

        // Long press bails straight to normal.
        let step = ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        assert_eq!(step.render, Some(Screen::Normal));
        assert_eq!(ctrl.state(), AppState::Normal);
    }

    #[test]
    fn settings_factory_reset_restores_defaults() {
        let mut ctrl = controller_in_normal(three_profiles());
        let mut sink = CaptureSink::new();
        ctrl.handle_event(InputEvent::EncoderLongPress, &mut sink);
        ctrl.handle_event(InputEvent::KeyPress('#'), &mut sink);

        // Drift the config away from the defaults first.
        ctrl.config.brightness = 32;
        ctrl.config.debounce_ms = 45;
        ctrl.config.current_profile = 2;

        for _ in 0..4 {
            ctrl.handle_event(InputEvent::EncoderCw, &mut sink);
        }
        assert_eq!(ctrl.selected_setting(), SettingItem::Reset);

        let step = ctrl.handle_event(InputEvent::EncoderShortPress, &mut sink);
        assert!(step.factory_reset);
        assert!(!step.save_config);
        assert_eq!(step.render, Some(Screen::Settings));

        // Defaults and the built-in profiles are back.
        assert_eq!(*ctrl.config(), SystemConfig::default());
        assert_eq!(ctrl.profiles().len(), 2);
        assert_eq!(ctrl.profiles()[0].name.as_str(), "DEV");
        assert_eq!(ctrl.profiles()[1].name.as_str(), "MEETING");
        assert_eq!(ctrl.state(), AppState::Settings);
    }

    #[test]
    fn stale_profile_index_resets_to_zero() {
        let mut cfg = SystemConfig::default();
        cfg.current_profile = 7;
        let ctrl = AppController::new(cfg, default_profiles());
        assert_eq!(ctrl.config().current_profile, 0);
        assert!(ctrl.active_profile().is_some());
    }
}
