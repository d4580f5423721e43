//! Host-controller collaborator contract.
//!
//! The HID driver never touches controller registers.  It borrows pipes
//! through [`HostController`] and is told about finished transfers via
//! [`crate::host::HidHost::on_transfer_event`], which the controller
//! calls from its interrupt handler together with the received bytes.

use crate::descriptor::{EndpointDescriptor, TransferType};
use crate::error::HcdError;

/// Opaque handle to an open pipe.
///
/// The owning device address is embedded so a completion can be routed
/// back to its slot without a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipeHandle {
    pub dev_addr: u8,
    pub xfer_type: TransferType,
    /// Controller-private pipe index.
    pub index: u8,
}

impl PipeHandle {
    pub const fn new(dev_addr: u8, xfer_type: TransferType, index: u8) -> Self {
        Self {
            dev_addr,
            xfer_type,
            index,
        }
    }
}

/// USB class tag passed to the controller when opening a pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassCode {
    Hid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device to host.
    In,
    /// Host to device.
    Out,
}

/// Transfer outcome reported by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XferEvent {
    Complete,
    Error,
    Stalled,
}

/// Pipe-level services the HID driver needs from the host controller.
pub trait HostController {
    /// Open a pipe to `endpoint` of device `dev_addr`.
    ///
    /// Called with the driver's slot table held; calling back into the
    /// driver from here panics, as for [`Self::pipe_xfer`].
    fn pipe_open(
        &self,
        dev_addr: u8,
        endpoint: &EndpointDescriptor,
        class: ClassCode,
    ) -> Result<PipeHandle, HcdError>;

    /// Release a pipe previously returned by [`Self::pipe_open`].
    fn pipe_close(&self, pipe: PipeHandle) -> Result<(), HcdError>;

    /// Queue one transfer of `len` bytes and return at once.
    ///
    /// The controller owns the transfer memory until the transfer ends.
    /// It then calls the HID driver's `on_transfer_event` with the bytes
    /// actually received (empty for failed or OUT transfers).
    ///
    /// # Panics
    ///
    /// This is called while the driver holds its slot table.  Calling
    /// back into the driver (`on_transfer_event`, `close`, ...) from
    /// inside `pipe_xfer` re-borrows that table and panics; completions
    /// must be delivered after `pipe_xfer` has returned.
    fn pipe_xfer(&self, pipe: PipeHandle, len: usize, dir: Direction) -> Result<(), HcdError>;
}
