//! Test doubles for the controller and enumeration collaborators.

use core::cell::{Cell, RefCell};

use crate::descriptor::{EndpointDescriptor, TransferType};
use crate::error::HcdError;
use crate::hcd::{ClassCode, Direction, HostController, PipeHandle};
use crate::usbh::{DeviceRegistry, DeviceState};

/// Interrupt IN endpoint descriptor.
pub fn endpoint_in(number: u8, max_packet: u16) -> EndpointDescriptor {
    EndpointDescriptor {
        length: 7,
        address: 0x80 | number,
        attributes: 0x03,
        max_packet_size: max_packet,
        interval: 10,
    }
}

/// Host controller that records calls.  Transfers stay queued; tests
/// deliver their completion (and data) through the dispatcher.
#[derive(Default)]
pub struct MockHcd {
    next_index: Cell<u8>,
    open_error: Cell<Option<HcdError>>,
    xfer_error: Cell<Option<HcdError>>,
    close_error: Cell<Option<HcdError>>,
    opened: RefCell<Vec<PipeHandle>>,
    submitted: RefCell<Vec<(PipeHandle, usize)>>,
    closed: RefCell<Vec<PipeHandle>>,
}

impl MockHcd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(&self, e: HcdError) {
        self.open_error.set(Some(e));
    }

    pub fn fail_xfer(&self, e: HcdError) {
        self.xfer_error.set(Some(e));
    }

    pub fn fail_close(&self, e: HcdError) {
        self.close_error.set(Some(e));
    }

    pub fn opened(&self) -> Vec<PipeHandle> {
        self.opened.borrow().clone()
    }

    pub fn submitted(&self) -> Vec<(PipeHandle, usize)> {
        self.submitted.borrow().clone()
    }

    pub fn closed(&self) -> Vec<PipeHandle> {
        self.closed.borrow().clone()
    }
}

impl HostController for MockHcd {
    fn pipe_open(
        &self,
        dev_addr: u8,
        endpoint: &EndpointDescriptor,
        class: ClassCode,
    ) -> Result<PipeHandle, HcdError> {
        assert_eq!(class, ClassCode::Hid);
        if let Some(e) = self.open_error.get() {
            return Err(e);
        }
        assert_eq!(endpoint.transfer_type(), TransferType::Interrupt);

        let index = self.next_index.get();
        self.next_index.set(index + 1);
        let pipe = PipeHandle::new(dev_addr, TransferType::Interrupt, index);
        self.opened.borrow_mut().push(pipe);
        Ok(pipe)
    }

    fn pipe_close(&self, pipe: PipeHandle) -> Result<(), HcdError> {
        self.closed.borrow_mut().push(pipe);
        match self.close_error.get() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn pipe_xfer(&self, pipe: PipeHandle, len: usize, dir: Direction) -> Result<(), HcdError> {
        assert_eq!(dir, Direction::In);
        if let Some(e) = self.xfer_error.get() {
            return Err(e);
        }
        self.submitted.borrow_mut().push((pipe, len));
        Ok(())
    }
}

/// Enumeration layer with a settable state per address.
pub struct MockUsbh {
    states: RefCell<[DeviceState; 8]>,
}

impl MockUsbh {
    pub fn new() -> Self {
        Self {
            states: RefCell::new([DeviceState::Unplugged; 8]),
        }
    }

    pub fn set(&self, dev_addr: u8, state: DeviceState) {
        self.states.borrow_mut()[dev_addr as usize] = state;
    }
}

impl DeviceRegistry for MockUsbh {
    fn device_state(&self, dev_addr: u8) -> DeviceState {
        self.states
            .borrow()
            .get(dev_addr as usize)
            .copied()
            .unwrap_or(DeviceState::Unplugged)
    }
}
