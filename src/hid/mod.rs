//! HID report types and the key→report dispatch layer.

pub mod consumer;
pub mod dispatch;
pub mod keyboard;

/// One outgoing HID report, either usage page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(keyboard::KeyboardReport),
    Consumer(consumer::ConsumerReport),
}

impl HidReport {
    /// Serialize into `buf` for transmission on the matching endpoint.
    /// Returns the number of bytes written, or 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(r) => r.serialize(buf),
            HidReport::Consumer(r) => r.serialize(buf),
        }
    }

    /// The all-released counterpart of this report.
    pub fn release(&self) -> HidReport {
        match self {
            HidReport::Keyboard(_) => HidReport::Keyboard(keyboard::KeyboardReport::empty()),
            HidReport::Consumer(_) => HidReport::Consumer(consumer::ConsumerReport::empty()),
        }
    }
}

/// Where finished reports go.  The embedded implementation hands them to
/// the USB writer task; tests capture them in a buffer.
pub trait HidSink {
    /// Queue one report for transmission.  Returns `false` if the report
    /// was dropped (queue full or link down).
    fn send(&mut self, report: HidReport) -> bool;
}
