//! USB host HID class driver.
//!
//! Sits between the enumeration layer (which finds and configures
//! devices) and the host-controller pipe layer (which moves bytes).
//! Recognises boot-protocol keyboard / mouse interfaces, opens their
//! interrupt IN pipe, issues one-shot input-report reads on request and
//! routes transfer completions, with their data, back to the owning
//! device slot.
//!
//! Usage: `cargo test` runs everything on the host against mock
//! controller and enumeration layers.
//!
//! Note: the crate is `no_std`; the controller driver supplies the
//! `critical-section` implementation for the target.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod boot;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hcd;
pub mod host;
pub mod keyboard;
pub mod mouse;
pub mod slot;
pub mod usbh;

#[cfg(test)]
mod mock;

pub use boot::{BootDriver, BootInterface, BootProtocol};
pub use error::{Error, HcdError};
pub use hcd::{HostController, PipeHandle, XferEvent};
pub use host::{HidHost, InterfaceHandle};
pub use slot::InterfaceStatus;
pub use usbh::{DeviceRegistry, DeviceState};
