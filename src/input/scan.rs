//! GPIO sampling for the 4x4 matrix and the quadrature encoder.
//!
//! Runs synchronously inside the polling loop: one `MatrixScanner::scan`
//! plus one `QuadratureDecoder::sample` per tick.  All debounce and
//! classification happens in the pure layer ([`super::InputPoller`]);
//! this module only turns pin levels into raw values.

use crate::config::{KEYPAD_COLS, KEYPAD_LAYOUT, KEYPAD_ROWS};
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull};

/// 4x4 matrix scanner - rows driven low one at a time, columns read with
/// pull-ups (a pressed key pulls its column low).
pub struct MatrixScanner<'d> {
    rows: [Output<'d>; KEYPAD_ROWS],
    cols: [Input<'d>; KEYPAD_COLS],
    pressed: [[bool; KEYPAD_COLS]; KEYPAD_ROWS],
}

impl<'d> MatrixScanner<'d> {
    pub fn new(row_pins: [AnyPin; KEYPAD_ROWS], col_pins: [AnyPin; KEYPAD_COLS]) -> Self {
        let rows = row_pins.map(|p| Output::new(p, Level::High, OutputDrive::Standard));
        let cols = col_pins.map(|p| Input::new(p, Pull::Up));
        Self {
            rows,
            cols,
            pressed: [[false; KEYPAD_COLS]; KEYPAD_ROWS],
        }
    }

    /// Scan the matrix once.  Returns the first key that newly went down
    /// this scan, as its layout character.  Held keys do not repeat.
    pub fn scan(&mut self) -> Option<char> {
        let mut new_key = None;

        for r in 0..KEYPAD_ROWS {
            self.rows[r].set_low();
            // Let the line settle before sampling the columns.
            cortex_m::asm::delay(64);

            for c in 0..KEYPAD_COLS {
                let down = self.cols[c].is_low();
                if down && !self.pressed[r][c] && new_key.is_none() {
                    new_key = KEYPAD_LAYOUT.as_bytes().get(r * KEYPAD_COLS + c).map(|&b| b as char);
                }
                self.pressed[r][c] = down;
            }

            self.rows[r].set_high();
        }

        new_key
    }

    /// True if any key is currently held (used by the POST keypad wait).
    pub fn any_key_down(&self) -> bool {
        self.pressed.iter().any(|row| row.iter().any(|&k| k))
    }
}

/// Gray-code transition lookup: index is (previous AB << 2) | current AB,
/// value is the count delta for that transition.
const QUAD_LUT: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Software quadrature decoder sampled at the poll rate.
pub struct QuadratureDecoder<'d> {
    pin_a: Input<'d>,
    pin_b: Input<'d>,
    prev: u8,
    count: i32,
}

impl<'d> QuadratureDecoder<'d> {
    pub fn new(pin_a: AnyPin, pin_b: AnyPin) -> Self {
        let pin_a = Input::new(pin_a, Pull::Up);
        let pin_b = Input::new(pin_b, Pull::Up);
        let prev = Self::read_ab(&pin_a, &pin_b);
        Self {
            pin_a,
            pin_b,
            prev,
            count: 0,
        }
    }

    fn read_ab(a: &Input<'d>, b: &Input<'d>) -> u8 {
        ((a.is_low() as u8) << 1) | (b.is_low() as u8)
    }

    /// Sample the pins once and return the running count.
    pub fn sample(&mut self) -> i32 {
        let ab = Self::read_ab(&self.pin_a, &self.pin_b);
        self.count += QUAD_LUT[((self.prev << 2) | ab) as usize] as i32;
        self.prev = ab;
        self.count
    }

    pub fn count(&self) -> i32 {
        self.count
    }
}

/// Encoder push button, active low.
pub struct EncoderButtonPin<'d> {
    pin: Input<'d>,
}

impl<'d> EncoderButtonPin<'d> {
    pub fn new(pin: AnyPin) -> Self {
        Self {
            pin: Input::new(pin, Pull::Up),
        }
    }

    pub fn is_down(&self) -> bool {
        self.pin.is_low()
    }
}
