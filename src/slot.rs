//! Per-device interface state and the address-indexed slot table.

use crate::config::{MAX_DEVICES, MAX_REPORT_SIZE};
use crate::hcd::PipeHandle;

/// Interface status as seen by the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceStatus {
    /// No interface opened on this slot.
    #[default]
    Uninitialized,
    /// Open, no request issued yet.
    Idle,
    /// A report request is outstanding.
    Busy,
    /// The last request finished and the report buffer is filled.
    Complete,
    /// The last request failed on the bus.
    Error,
    /// Returned by status queries for a device that is not configured.
    /// Never stored in a slot.
    InvalidRequest,
}

/// State of one boot interface on one device.
///
/// The slot owns the memory its report lands in, so an outstanding
/// transfer never refers to a caller's buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceSlot {
    pub pipe: Option<PipeHandle>,
    pub report_size: usize,
    pub status: InterfaceStatus,
    report: [u8; MAX_REPORT_SIZE],
    report_len: usize,
}

impl DeviceSlot {
    pub const EMPTY: Self = Self {
        pipe: None,
        report_size: 0,
        status: InterfaceStatus::Uninitialized,
        report: [0; MAX_REPORT_SIZE],
        report_len: 0,
    };

    /// A freshly opened slot.
    pub const fn opened(pipe: PipeHandle, report_size: usize) -> Self {
        Self {
            pipe: Some(pipe),
            report_size,
            status: InterfaceStatus::Idle,
            ..Self::EMPTY
        }
    }

    pub fn is_open(&self) -> bool {
        self.pipe.is_some()
    }

    /// Forget everything; the slot is ready for a different device.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Mark a request outstanding and drop the previous report.
    pub fn begin_request(&mut self) {
        self.status = InterfaceStatus::Busy;
        self.report_len = 0;
    }

    /// Store the bytes of a successful transfer, truncated to the
    /// report size.  Short packets are kept as received.
    pub fn complete(&mut self, data: &[u8]) {
        let len = data.len().min(self.report_size);
        self.report[..len].copy_from_slice(&data[..len]);
        self.report_len = len;
        self.status = InterfaceStatus::Complete;
    }

    pub fn fail(&mut self) {
        self.report_len = 0;
        self.status = InterfaceStatus::Error;
    }

    /// Bytes of the last completed report.
    pub fn report(&self) -> Option<&[u8]> {
        (self.status == InterfaceStatus::Complete).then(|| &self.report[..self.report_len])
    }
}

impl Default for DeviceSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fixed-capacity table of [`DeviceSlot`]s keyed by device address.
///
/// Address `n` lives at index `n - 1`; address 0 and addresses above
/// [`MAX_DEVICES`] have no slot.
#[derive(Clone, Debug)]
pub struct SlotTable {
    slots: [DeviceSlot; MAX_DEVICES],
}

impl SlotTable {
    pub const fn new() -> Self {
        Self {
            slots: [DeviceSlot::EMPTY; MAX_DEVICES],
        }
    }

    fn index(dev_addr: u8) -> Option<usize> {
        let idx = (dev_addr as usize).checked_sub(1)?;
        (idx < MAX_DEVICES).then_some(idx)
    }

    pub fn get(&self, dev_addr: u8) -> Option<&DeviceSlot> {
        Self::index(dev_addr).map(|i| &self.slots[i])
    }

    pub fn get_mut(&mut self, dev_addr: u8) -> Option<&mut DeviceSlot> {
        Self::index(dev_addr).map(move |i| &mut self.slots[i])
    }

    /// Slot whose stored pipe equals `pipe`, resolved through the address
    /// the handle carries.
    pub fn find_by_pipe(&mut self, pipe: PipeHandle) -> Option<&mut DeviceSlot> {
        self.get_mut(pipe.dev_addr)
            .filter(|slot| slot.pipe == Some(pipe))
    }

    /// Zero every slot.
    pub fn reset(&mut self) {
        self.slots = [DeviceSlot::EMPTY; MAX_DEVICES];
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_open()).count()
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}
