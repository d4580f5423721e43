//! Boot-protocol keyboard: the built-in keyboard interface and a decoder
//! for the report a completed request leaves in the slot.
//!
//! ```text
//! byte 0     modifier bits (LCtrl LShift LAlt LGui RCtrl RShift RAlt RGui)
//! byte 1     reserved
//! byte 2..8  usage IDs of held keys, 0 for unused entries
//! ```

#[cfg(feature = "keyboard")]
use crate::boot::{BootInterface, BootProtocol};

/// Keyboard interface slots for every device address.
#[cfg(feature = "keyboard")]
pub static KEYBOARD: BootInterface = BootInterface::new(BootProtocol::Keyboard);

pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Usage ID filling every key entry when too many keys are held.
pub const KEY_ERROR_ROLLOVER: u8 = 0x01;

/// First usage ID naming a real key (`a`); lower IDs are error codes.
const FIRST_KEY_USAGE: u8 = 0x04;

pub const MOD_LEFT_CTRL: u8 = 0x01;
pub const MOD_LEFT_SHIFT: u8 = 0x02;
pub const MOD_LEFT_ALT: u8 = 0x04;
pub const MOD_LEFT_GUI: u8 = 0x08;
pub const MOD_RIGHT_CTRL: u8 = 0x10;
pub const MOD_RIGHT_SHIFT: u8 = 0x20;
pub const MOD_RIGHT_ALT: u8 = 0x40;
pub const MOD_RIGHT_GUI: u8 = 0x80;

/// Either side.
pub const MOD_CTRL: u8 = MOD_LEFT_CTRL | MOD_RIGHT_CTRL;
pub const MOD_SHIFT: u8 = MOD_LEFT_SHIFT | MOD_RIGHT_SHIFT;
pub const MOD_ALT: u8 = MOD_LEFT_ALT | MOD_RIGHT_ALT;
pub const MOD_GUI: u8 = MOD_LEFT_GUI | MOD_RIGHT_GUI;

/// Decoded boot keyboard report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// `None` if fewer than [`KEYBOARD_REPORT_SIZE`] bytes arrived.
    pub fn parse(report: &[u8]) -> Option<Self> {
        let (&modifiers, rest) = report.split_first()?;
        let keys = rest.get(1..KEYBOARD_REPORT_SIZE - 1)?;
        Some(Self {
            modifiers,
            keys: keys.try_into().ok()?,
        })
    }

    /// Any bit of `mask` set, e.g. [`MOD_CTRL`].
    pub fn has_modifier(&self, mask: u8) -> bool {
        self.modifiers & mask != 0
    }

    /// Held keys in report order, error codes and empty entries skipped.
    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&k| k >= FIRST_KEY_USAGE)
    }

    pub fn is_pressed(&self, usage: u8) -> bool {
        self.keys().any(|k| k == usage)
    }

    /// Phantom state: the key entries carry no usable information.
    pub fn is_rollover(&self) -> bool {
        self.keys.contains(&KEY_ERROR_ROLLOVER)
    }
}
