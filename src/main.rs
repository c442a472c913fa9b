//! Macro keypad firmware entry point (nRF52840, Embassy).
//!
//! Boot order: flash → config → keymap → display → USB → POST → splash,
//! then the 10 ms polling loop that drives everything else.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use panic_probe as _;

use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Duration, Instant, Ticker, Timer};
use embassy_usb::class::hid::HidWriter;
use embassy_usb::UsbDevice;

use macropad::app::post::{wait_until, PostResults};
use macropad::app::AppController;
use macropad::config::{INPUT_POLL_MS, MAX_KEYMAP_JSON, POST_WAIT_MS};
use macropad::input::scan::{EncoderButtonPin, MatrixScanner, QuadratureDecoder};
use macropad::input::{InputPoller, RawSample};
use macropad::profile::{default_profiles, json};
use macropad::status::{status_color, LedColor, LinkMonitor};
use macropad::storage::ConfigStore;
use macropad::ui::display::{self, Display};
use macropad::ui::{RefreshGate, Screen};
use macropad::usb::hid_device::{self, hid_connected, ChannelHidSink};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

type UsbDrv = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDrv>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn writer_task(
    keyboard: HidWriter<'static, UsbDrv, 8>,
    consumer: HidWriter<'static, UsbDrv, 8>,
) -> ! {
    hid_device::hid_writer_task(keyboard, consumer).await
}

/// Tri-color status LED, active high.
struct StatusLed<'d> {
    red: Output<'d>,
    green: Output<'d>,
    blue: Output<'d>,
}

impl<'d> StatusLed<'d> {
    fn set(&mut self, color: LedColor) {
        let (r, g, b) = match color {
            LedColor::Off => (false, false, false),
            LedColor::Red => (true, false, false),
            LedColor::Green => (false, true, false),
            LedColor::Blue => (false, false, true),
        };
        set_level(&mut self.red, r);
        set_level(&mut self.green, g);
        set_level(&mut self.blue, b);
    }
}

fn set_level(pin: &mut Output, on: bool) {
    if on {
        pin.set_high();
    } else {
        pin.set_low();
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("macropad booting");

    // Flash-backed configuration.
    let mut flash = BlockingAsync::new(Nvmc::new(p.NVMC));
    let mut store = ConfigStore::new();
    let storage_ok = store.load(&mut flash).await;

    // Keymap: stored JSON if present and parseable, built-ins otherwise.
    let mut keymap_buf = [0u8; MAX_KEYMAP_JSON];
    let keymap_len = store.load_keymap(&mut flash, &mut keymap_buf).await;
    let mut profiles = heapless::Vec::new();
    let parsed = json::parse_keymap(&keymap_buf[..keymap_len], &mut profiles);
    if parsed == 0 {
        if keymap_len > 0 {
            warn!("Stored keymap unusable - falling back to built-in profiles");
        }
        profiles = default_profiles();
    } else {
        info!("Loaded {} profiles from keymap", parsed);
    }

    let mut ctrl = AppController::new(store.config().clone(), profiles);

    // Display init is the one fatal boot step: without it nothing can
    // be shown to the user.
    let mut twim_config = twim::Config::default();
    twim_config.frequency = twim::Frequency::K400;
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim_config);
    let mut disp = unwrap!(display::init(i2c), "display init failed");
    display::set_brightness(&mut disp, ctrl.config().brightness);

    // USB composite HID.
    let usb = hid_device::init(p.USBD);
    unwrap!(spawner.spawn(usb_task(usb.device)));
    unwrap!(spawner.spawn(writer_task(usb.keyboard_writer, usb.consumer_writer)));

    // Input hardware.
    let mut scanner = MatrixScanner::new(
        [
            p.P0_04.degrade(),
            p.P0_05.degrade(),
            p.P0_06.degrade(),
            p.P0_07.degrade(),
        ],
        [
            p.P0_08.degrade(),
            p.P0_09.degrade(),
            p.P0_10.degrade(),
            p.P0_11.degrade(),
        ],
    );
    let mut decoder = QuadratureDecoder::new(p.P0_12.degrade(), p.P0_13.degrade());
    let button = EncoderButtonPin::new(p.P0_14.degrade());

    let mut led = StatusLed {
        red: Output::new(p.P0_28.degrade(), Level::Low, OutputDrive::Standard),
        green: Output::new(p.P0_29.degrade(), Level::Low, OutputDrive::Standard),
        blue: Output::new(p.P0_30.degrade(), Level::Low, OutputDrive::Standard),
    };

    // Power-on self test.  The interactive waits block on purpose: POST
    // precedes normal operation.
    let results = run_post(&mut scanner, &mut decoder, &button, storage_ok);
    display::draw_post(&mut disp, &results);
    if results.all_passed() {
        info!("POST passed");
    } else {
        warn!("POST failed: {:?}", results);
    }
    led.set(status_color(hid_connected(), results.all_passed(), now_ms()));

    // Leave the summary up long enough to read before the splash.
    Timer::after(Duration::from_secs(2)).await;

    let splash = ctrl.finish_post(results, now_ms());
    render(&mut disp, &ctrl, splash);

    // Main polling loop.
    let mut poller = InputPoller::new();
    let mut sink = ChannelHidSink::new();
    let mut gate = RefreshGate::new();
    let mut link = LinkMonitor::new();
    let mut ticker = Ticker::every(Duration::from_millis(INPUT_POLL_MS));

    loop {
        ticker.next().await;
        let now = now_ms();

        let sample = RawSample {
            key: scanner.scan(),
            encoder_count: decoder.sample(),
            button_down: button.is_down(),
            now_ms: now,
        };

        let timing = ctrl.config().timing();
        if let Some(event) = poller.poll(&sample, &timing) {
            let step = ctrl.handle_event(event, &mut sink);
            if let Some(screen) = step.render {
                gate.request(screen);
            }
            if step.save_config {
                store.update(ctrl.config().clone());
                store.save(&mut flash).await;
                display::set_brightness(&mut disp, ctrl.config().brightness);
            }
            if step.factory_reset {
                // The controller already fell back to the defaults and
                // built-in profiles; wipe the persisted state to match.
                store.factory_reset(&mut flash).await;
                display::set_brightness(&mut disp, ctrl.config().brightness);
            }
        }

        if let Some(screen) = ctrl.tick(now) {
            gate.request(screen);
        }

        if let Some(screen) = gate.due(now) {
            render(&mut disp, &ctrl, screen);
        }

        let connected = hid_connected();
        led.set(status_color(connected, ctrl.post_results().all_passed(), now));
        if link.should_retry(connected, now) {
            // USB reconnection is host-driven; just surface the outage.
            info!("USB link down - waiting for host");
        }
    }
}

fn run_post(
    scanner: &mut MatrixScanner,
    decoder: &mut QuadratureDecoder,
    button: &EncoderButtonPin,
    storage_ok: bool,
) -> PostResults {
    let mut results = PostResults {
        // Reaching this point means the I2C bus answered and the
        // display initialised; USB came up earlier in boot.  Storage
        // carries the outcome of the boot-time flash read.
        i2c: true,
        display: true,
        usb: true,
        storage: storage_ok,
        ..Default::default()
    };

    info!("POST: press any key");
    results.keypad = wait_until(now_ms() + POST_WAIT_MS, now_ms, || {
        scanner.scan();
        scanner.any_key_down()
    });

    info!("POST: turn the encoder");
    results.encoder = wait_until(now_ms() + POST_WAIT_MS, now_ms, || decoder.sample() != 0);

    info!("POST: press the encoder button");
    results.button = wait_until(now_ms() + POST_WAIT_MS, now_ms, || button.is_down());

    results
}

fn render<I2C>(disp: &mut Display<I2C>, ctrl: &AppController, screen: Screen)
where
    I2C: embedded_hal::i2c::I2c,
{
    match screen {
        Screen::Post => display::draw_post(disp, ctrl.post_results()),
        Screen::Splash => display::draw_splash(disp),
        Screen::Normal => display::draw_normal(disp, ctrl.active_profile(), hid_connected()),
        Screen::Menu => display::draw_menu(disp, ctrl.profiles(), ctrl.menu_cursor()),
        Screen::Settings => display::draw_settings(disp, ctrl.config(), ctrl.selected_setting()),
    }
}
