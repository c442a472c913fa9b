//! USB Device subsystem - presents a composite HID device to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`.  We create a **composite device** with two HID
//! interfaces:
//!
//! - Interface 0: Keyboard (boot protocol)
//! - Interface 1: Consumer control (media keys)
//!
//! The writer task takes queued reports from the polling loop and
//! pulses them: press report, short hold, all-zero release.

pub mod hid_device;
