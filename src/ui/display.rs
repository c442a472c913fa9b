//! SSD1306 OLED display wrapper.

use core::fmt::Write as _;

use crate::app::post::PostResults;
use crate::config::FIRMWARE_VERSION;
use crate::error::Error;
use crate::profile::{Profile, SystemConfig};
use crate::ui::SettingItem;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
///
/// Failure here is the one fatal boot condition, since nothing can be
/// reported to the user without a display.
pub fn init<I2C>(i2c: I2C) -> Result<Display<I2C>, Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().map_err(|_| Error::Display)?;
    display.clear_buffer();
    let _ = display.flush();
    Ok(display)
}

/// Apply the configured brightness, mapped onto the driver's contrast
/// levels.
pub fn set_brightness<I2C>(display: &mut Display<I2C>, brightness: u8)
where
    I2C: embedded_hal::i2c::I2c,
{
    let level = match brightness {
        0..=50 => Brightness::DIMMEST,
        51..=101 => Brightness::DIM,
        102..=152 => Brightness::NORMAL,
        153..=203 => Brightness::BRIGHT,
        _ => Brightness::BRIGHTEST,
    };
    let _ = display.set_brightness(level);
}

fn text_style() -> embedded_graphics::mono_font::MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// Render the boot splash.
pub fn draw_splash<I2C>(display: &mut Display<I2C>)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::new("MACROPAD", Point::new(34, 24), text_style()).draw(display);

    let mut version: heapless::String<16> = heapless::String::new();
    let _ = write!(version, "v{FIRMWARE_VERSION}");
    let _ = Text::new(version.as_str(), Point::new(40, 42), text_style()).draw(display);

    let _ = display.flush();
}

/// Render the normal operating screen: active profile + link status.
pub fn draw_normal<I2C>(display: &mut Display<I2C>, profile: Option<&Profile>, hid_connected: bool)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let name = profile.map(|p| p.name.as_str()).unwrap_or("(no profile)");
    let _ = Text::new(name, Point::new(0, 10), text_style()).draw(display);

    let status = if hid_connected { "USB ready" } else { "USB waiting" };
    let _ = Text::new(status, Point::new(0, 52), text_style()).draw(display);

    let _ = display.flush();
}

/// Render the profile selection list with the cursor row marked.
pub fn draw_menu<I2C>(display: &mut Display<I2C>, profiles: &[Profile], selected: usize)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::new("Profiles   #:setup", Point::new(0, 10), text_style()).draw(display);

    // Window of 4 rows, scrolled so the cursor stays visible.
    let first = selected.saturating_sub(3);
    for (row, (idx, profile)) in profiles.iter().enumerate().skip(first).take(4).enumerate() {
        let marker = if idx == selected { ">" } else { " " };
        let mut line: heapless::String<20> = heapless::String::new();
        let _ = line.push_str(marker);
        let _ = line.push_str(" ");
        let _ = line.push_str(profile.name.as_str());
        let y = 24 + (row as i32 * 10);
        let _ = Text::new(line.as_str(), Point::new(0, y), text_style()).draw(display);
    }

    let _ = display.flush();
}

/// Render the settings editor with the cursor row marked.
pub fn draw_settings<I2C>(display: &mut Display<I2C>, config: &SystemConfig, selected: SettingItem)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::new("Settings", Point::new(0, 7), text_style()).draw(display);

    for (row, item) in SettingItem::ALL.iter().enumerate() {
        let marker = if *item == selected { ">" } else { " " };
        let mut line: heapless::String<40> = heapless::String::new();
        let _ = line.push_str(marker);
        let _ = line.push_str(" ");
        match item {
            SettingItem::Brightness => {
                let _ = write!(line, "Brightness {}", config.brightness);
            }
            SettingItem::Debounce => {
                let _ = write!(line, "Debounce {}ms", config.debounce_ms);
            }
            SettingItem::LongPress => {
                let _ = write!(line, "Long press {}ms", config.long_press_ms);
            }
            SettingItem::Keymap => {
                let _ = write!(line, "Keymap {}", config.keymap_name.as_str());
            }
            SettingItem::Reset | SettingItem::Save | SettingItem::Back => {
                let _ = line.push_str(item.label());
            }
        }
        // Seven rows on a 64-pixel panel: 8 px pitch below the title.
        let y = 15 + (row as i32 * 8);
        let _ = Text::new(line.as_str(), Point::new(0, y), text_style()).draw(display);
    }

    let _ = display.flush();
}

/// Render the self-test summary.
pub fn draw_post<I2C>(display: &mut Display<I2C>, results: &PostResults)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let title = if results.all_passed() {
        "POST: PASS"
    } else {
        "POST: FAIL"
    };
    let _ = Text::new(title, Point::new(0, 8), text_style()).draw(display);

    let rows: [(&str, bool); 7] = [
        ("I2C", results.i2c),
        ("Disp", results.display),
        ("USB", results.usb),
        ("Store", results.storage),
        ("Keys", results.keypad),
        ("Enc", results.encoder),
        ("Btn", results.button),
    ];

    // Two columns of pass/fail rows.
    for (i, (name, ok)) in rows.iter().enumerate() {
        let mut line: heapless::String<16> = heapless::String::new();
        let _ = write!(line, "{name} {}", if *ok { "OK" } else { "--" });
        let x = if i < 4 { 0 } else { 66 };
        let y = 22 + ((i % 4) as i32 * 10);
        let _ = Text::new(line.as_str(), Point::new(x, y), text_style()).draw(display);
    }

    let _ = display.flush();
}
