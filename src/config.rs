//! Crate-wide constants and compile-time configuration.
//!
//! Capacity limits and descriptor constants live here so they can be
//! tuned in one place.  Which boot sub-drivers exist is selected with
//! the `keyboard` / `mouse` Cargo features.

// Host stack

/// Maximum number of devices the host stack can address at once.
///
/// Address 0 is the not-yet-addressed state and never gets a slot, so
/// valid addresses are `1..=MAX_DEVICES`.
pub const MAX_DEVICES: usize = 5;

/// Largest input report a slot can hold.  Boot interfaces whose
/// endpoint packet is bigger than this are refused at open time.
pub const MAX_REPORT_SIZE: usize = 64;

/// Capacity of the boot-driver dispatch table in [`crate::host::HidHost`].
pub const MAX_BOOT_DRIVERS: usize = 4;

// USB descriptor constants

/// Standard descriptor header offsets (byte 0 = length, byte 1 = type).
pub const DESC_OFFSET_LENGTH: usize = 0;
pub const DESC_OFFSET_TYPE: usize = 1;

/// Fixed sizes of the descriptors walked by the interface opener.
pub const INTERFACE_DESC_LEN: usize = 9;
pub const HID_DESC_MIN_LEN: usize = 9;
pub const ENDPOINT_DESC_LEN: usize = 7;

/// USB interface class code for HID.
pub const CLASS_HID: u8 = 0x03;

/// HID interface subclass: boot interface.
pub const HID_SUBCLASS_BOOT: u8 = 0x01;

/// HID boot interface protocol codes.
pub const HID_PROTOCOL_KEYBOARD: u8 = 0x01;
pub const HID_PROTOCOL_MOUSE: u8 = 0x02;
