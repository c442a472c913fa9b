//! USB HID composite device - keyboard + consumer control.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes two HID endpoints.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config;
use crate::hid::consumer::CONSUMER_REPORT_DESCRIPTOR;
use crate::hid::keyboard::KEYBOARD_REPORT_DESCRIPTOR;
use crate::hid::{HidReport, HidSink};
use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_time::{Duration, Timer};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

static KB_STATE: StaticCell<State> = StaticCell::new();
static CONSUMER_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

/// Outgoing report queue, fed by the polling loop via [`ChannelHidSink`].
pub static REPORT_CHANNEL: Channel<CriticalSectionRawMutex, HidReport, 16> = Channel::new();

static CONFIGURED: AtomicBool = AtomicBool::new(false);

struct UsbStateHandler;

impl embassy_usb::Handler for UsbStateHandler {
    fn configured(&mut self, configured: bool) {
        CONFIGURED.store(configured, Ordering::Relaxed);
    }

    fn suspended(&mut self, suspended: bool) {
        if suspended {
            CONFIGURED.store(false, Ordering::Relaxed);
        }
    }
}

/// True once the host has configured the device (reports can flow).
pub fn hid_connected() -> bool {
    CONFIGURED.load(Ordering::Relaxed)
}

/// Sink that hands reports to the USB writer task.
pub struct ChannelHidSink {
    tx: Sender<'static, CriticalSectionRawMutex, HidReport, 16>,
}

impl ChannelHidSink {
    pub fn new() -> Self {
        Self {
            tx: REPORT_CHANNEL.sender(),
        }
    }
}

impl HidSink for ChannelHidSink {
    fn send(&mut self, report: HidReport) -> bool {
        if !hid_connected() {
            return false;
        }
        if self.tx.try_send(report).is_err() {
            warn!("HID report queue full - dropping report");
            return false;
        }
        true
    }
}

impl Default for ChannelHidSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Build result containing the USB device runner and the two HID writers.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>>,
    pub keyboard_writer:
        HidWriter<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>, 8>,
    pub consumer_writer:
        HidWriter<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>, 8>,
}

/// Initialise the USB stack and create the composite HID device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbHidDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    // Build the USB device.
    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let usb_handler = USB_STATE_HANDLER.init(UsbStateHandler);
    builder.handler(usb_handler);

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let keyboard_writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let consumer_state = CONSUMER_STATE.init(State::new());
    let consumer_config = HidConfig {
        report_descriptor: CONSUMER_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let consumer_writer = HidWriter::new(&mut builder, consumer_state, consumer_config);

    let device = builder.build();

    info!("USB HID composite device initialised (keyboard + consumer)");

    UsbHidDevice {
        device,
        keyboard_writer,
        consumer_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, and endpoint servicing.
/// It runs forever (or until the USB cable is disconnected).
pub async fn run_usb_device(
    mut device: UsbDevice<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>>,
) -> ! {
    info!("USB device task started");
    device.run().await
}

/// HID pulse task - takes queued press reports and writes each as a
/// press, a short hold, then the all-zero release on the same endpoint.
///
/// The release is written even when the press write failed, so a key
/// can never be left stuck down on the host.
pub async fn hid_writer_task(
    mut keyboard: HidWriter<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>, 8>,
    mut consumer: HidWriter<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>, 8>,
) -> ! {
    info!("HID writer task started - waiting for reports");

    let mut buf = [0u8; 8];

    loop {
        let report = REPORT_CHANNEL.receive().await;

        let n = report.serialize(&mut buf);
        let pressed = match &report {
            HidReport::Keyboard(_) => keyboard.write(&buf[..n]).await,
            HidReport::Consumer(_) => consumer.write(&buf[..n]).await,
        };
        if pressed.is_err() {
            warn!("USB press write failed");
        }

        Timer::after(Duration::from_millis(config::HID_PULSE_MS)).await;

        let release = report.release();
        let n = release.serialize(&mut buf);
        let released = match &release {
            HidReport::Keyboard(_) => keyboard.write(&buf[..n]).await,
            HidReport::Consumer(_) => consumer.write(&buf[..n]).await,
        };
        if released.is_err() {
            warn!("USB release write failed");
        }
    }
}
