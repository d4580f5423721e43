//! Boot-protocol mouse: the built-in mouse interface and a decoder for
//! its report.
//!
//! ```text
//! byte 0  buttons (bit 0 left, bit 1 right, bit 2 middle)
//! byte 1  X displacement, i8
//! byte 2  Y displacement, i8
//! byte 3  wheel, i8 (optional, not part of the boot format)
//! ```

#[cfg(feature = "mouse")]
use crate::boot::{BootInterface, BootProtocol};

/// Mouse interface slots for every device address.
#[cfg(feature = "mouse")]
pub static MOUSE: BootInterface = BootInterface::new(BootProtocol::Mouse);

pub const MOUSE_REPORT_MIN_SIZE: usize = 3;

pub const BUTTON_LEFT: u8 = 0x01;
pub const BUTTON_RIGHT: u8 = 0x02;
pub const BUTTON_MIDDLE: u8 = 0x04;

/// Decoded boot mouse report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    pub dx: i8,
    pub dy: i8,
    /// 0 for three-byte reports.
    pub wheel: i8,
}

impl MouseReport {
    pub fn parse(report: &[u8]) -> Option<Self> {
        match *report {
            [buttons, dx, dy, ref rest @ ..] => Some(Self {
                buttons,
                dx: dx as i8,
                dy: dy as i8,
                wheel: rest.first().map_or(0, |&w| w as i8),
            }),
            _ => None,
        }
    }

    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons & button != 0
    }
}
