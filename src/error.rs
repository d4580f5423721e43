//! Unified error type for the HID host driver.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for
//! efficient on-target logging.

/// Error returned synchronously by the application-facing and
/// enumeration-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The device is not in the configured state, or has no open
    /// interface for the requested protocol.
    DeviceNotReady,

    /// Bad argument: empty or short report buffer, out-of-range device
    /// address, or a malformed descriptor chain.
    InvalidParameter,

    /// A report request is already outstanding on this interface.
    InterfaceBusy,

    /// The interface holds no completed report (never requested, or the
    /// last transfer failed).
    NoReport,

    /// The host controller could not open a pipe for the endpoint.
    TransportOpenFailed(HcdError),

    /// The host controller rejected a transfer submission.
    TransportSubmitFailed(HcdError),

    /// No room left in the boot-driver dispatch table.
    DriverTableFull,
}

/// Subset of host-controller errors we propagate (keeps the enum `Copy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HcdError {
    /// The controller refused the request.
    Rejected,
    /// No free pipe / queue head / transfer descriptor.
    NoResources,
    /// The handle does not name an open pipe.
    InvalidPipe,
    /// The endpoint is halted.
    Stalled,
}

impl Error {
    /// Map a controller failure during `pipe_open`.
    pub const fn from_open(e: HcdError) -> Self {
        Error::TransportOpenFailed(e)
    }

    /// Map a controller failure during `pipe_xfer`.
    pub const fn from_submit(e: HcdError) -> Self {
        Error::TransportSubmitFailed(e)
    }
}
