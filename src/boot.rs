//! Boot-protocol interface drivers.
//!
//! A [`BootDriver`] owns the slot table for one boot protocol and
//! implements open / request / completion / close for it.  The host
//! dispatches to drivers through a table of trait objects, so adding a
//! boot class means registering another driver, not editing the
//! dispatch code.
//!
//! [`BootInterface`] is the driver used for both keyboard and mouse:
//! one input report per request, sized from the endpoint's max packet
//! size and kept in the device slot until the next request.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{HID_PROTOCOL_KEYBOARD, HID_PROTOCOL_MOUSE, MAX_REPORT_SIZE};
use crate::descriptor::EndpointDescriptor;
use crate::error::Error;
use crate::hcd::{ClassCode, Direction, HostController, PipeHandle, XferEvent};
use crate::slot::{DeviceSlot, InterfaceStatus, SlotTable};

/// HID boot interface protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootProtocol {
    Keyboard,
    Mouse,
}

impl BootProtocol {
    /// Map `bInterfaceProtocol`; `None` for protocols we don't know.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            HID_PROTOCOL_KEYBOARD => Some(BootProtocol::Keyboard),
            HID_PROTOCOL_MOUSE => Some(BootProtocol::Mouse),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            BootProtocol::Keyboard => HID_PROTOCOL_KEYBOARD,
            BootProtocol::Mouse => HID_PROTOCOL_MOUSE,
        }
    }
}

/// One boot-protocol sub-driver as seen by [`crate::host::HidHost`].
///
/// Device addresses are raw enumeration addresses; drivers reject
/// addresses without a slot instead of indexing out of bounds.
pub trait BootDriver {
    fn protocol(&self) -> BootProtocol;

    /// Forget every slot.  Called once at stack start-up.
    fn init(&self);

    /// Open the interrupt IN pipe for `dev_addr` and mark the slot idle.
    fn open(
        &self,
        hcd: &dyn HostController,
        dev_addr: u8,
        endpoint: &EndpointDescriptor,
    ) -> Result<(), Error>;

    /// Apply a completion if `pipe` belongs to this driver.  Returns
    /// whether it did.  `data` holds the received bytes.  Runs in
    /// interrupt context.
    fn on_transfer_event(&self, pipe: PipeHandle, event: XferEvent, data: &[u8]) -> bool;

    /// Release the pipe of `dev_addr`, if any, and clear its slot.
    fn close(&self, hcd: &dyn HostController, dev_addr: u8);

    fn is_open(&self, dev_addr: u8) -> bool;

    fn report_size(&self, dev_addr: u8) -> Option<usize>;

    /// Submit one input-report read and mark the slot busy.
    fn request_report(&self, hcd: &dyn HostController, dev_addr: u8) -> Result<(), Error>;

    /// Copy the last completed report into `buf`; returns its length.
    fn read_report(&self, dev_addr: u8, buf: &mut [u8]) -> Result<usize, Error>;

    fn status(&self, dev_addr: u8) -> InterfaceStatus;
}

/// Slot table for one boot protocol, shared between application and
/// completion (IRQ) context.
pub struct BootInterface {
    protocol: BootProtocol,
    slots: Mutex<CriticalSectionRawMutex, RefCell<SlotTable>>,
}

impl BootInterface {
    pub const fn new(protocol: BootProtocol) -> Self {
        Self {
            protocol,
            slots: Mutex::new(RefCell::new(SlotTable::new())),
        }
    }

    /// Run `f` on the slot table inside a critical section.
    fn with_slots<R>(&self, f: impl FnOnce(&mut SlotTable) -> R) -> R {
        self.slots.lock(|table| f(&mut *table.borrow_mut()))
    }

    /// Copy of the slot for `dev_addr`.
    pub fn slot(&self, dev_addr: u8) -> Option<DeviceSlot> {
        self.with_slots(|table| table.get(dev_addr).copied())
    }
}

impl BootDriver for BootInterface {
    fn protocol(&self) -> BootProtocol {
        self.protocol
    }

    fn init(&self) {
        self.with_slots(SlotTable::reset);
    }

    fn open(
        &self,
        hcd: &dyn HostController,
        dev_addr: u8,
        endpoint: &EndpointDescriptor,
    ) -> Result<(), Error> {
        let report_size = endpoint.packet_size();
        if !endpoint.is_in() || report_size == 0 || report_size > MAX_REPORT_SIZE {
            warn!(
                "Boot {:?}: unusable endpoint {:x} (max packet {})",
                self.protocol,
                endpoint.address,
                report_size
            );
            return Err(Error::InvalidParameter);
        }

        self.with_slots(|table| {
            let slot = table.get_mut(dev_addr).ok_or(Error::InvalidParameter)?;
            if slot.is_open() {
                warn!("Boot {:?}: device {} already open", self.protocol, dev_addr);
                return Err(Error::InvalidParameter);
            }

            // TODO: size reports from the report descriptor once it is fetched
            let pipe = hcd
                .pipe_open(dev_addr, endpoint, ClassCode::Hid)
                .map_err(|e| {
                    warn!("Boot {:?}: pipe open failed: {:?}", self.protocol, e);
                    Error::from_open(e)
                })?;

            *slot = DeviceSlot::opened(pipe, report_size);
            Ok(())
        })
    }

    fn on_transfer_event(&self, pipe: PipeHandle, event: XferEvent, data: &[u8]) -> bool {
        self.with_slots(|table| match table.find_by_pipe(pipe) {
            Some(slot) => {
                match event {
                    XferEvent::Complete => slot.complete(data),
                    XferEvent::Error | XferEvent::Stalled => slot.fail(),
                }
                true
            }
            None => false,
        })
    }

    fn close(&self, hcd: &dyn HostController, dev_addr: u8) {
        let released = self.with_slots(|table| {
            let slot = table.get_mut(dev_addr)?;
            let pipe = slot.pipe?;
            slot.clear();
            Some(pipe)
        });

        if let Some(pipe) = released {
            debug!("Boot {:?}: device {} closed", self.protocol, dev_addr);
            if let Err(e) = hcd.pipe_close(pipe) {
                warn!("Boot {:?}: pipe close failed: {:?}", self.protocol, e);
            }
        }
    }

    fn is_open(&self, dev_addr: u8) -> bool {
        self.with_slots(|table| table.get(dev_addr).is_some_and(DeviceSlot::is_open))
    }

    fn report_size(&self, dev_addr: u8) -> Option<usize> {
        self.with_slots(|table| {
            table
                .get(dev_addr)
                .filter(|slot| slot.is_open())
                .map(|slot| slot.report_size)
        })
    }

    fn request_report(&self, hcd: &dyn HostController, dev_addr: u8) -> Result<(), Error> {
        self.with_slots(|table| {
            let slot = table.get_mut(dev_addr).ok_or(Error::DeviceNotReady)?;
            let pipe = slot.pipe.ok_or(Error::DeviceNotReady)?;
            if slot.status == InterfaceStatus::Busy {
                return Err(Error::InterfaceBusy);
            }

            hcd.pipe_xfer(pipe, slot.report_size, Direction::In)
                .map_err(|e| {
                    warn!("Boot {:?}: transfer submit failed: {:?}", self.protocol, e);
                    Error::from_submit(e)
                })?;

            slot.begin_request();
            Ok(())
        })
    }

    fn read_report(&self, dev_addr: u8, buf: &mut [u8]) -> Result<usize, Error> {
        self.with_slots(|table| {
            let slot = table
                .get(dev_addr)
                .filter(|slot| slot.is_open())
                .ok_or(Error::DeviceNotReady)?;
            if buf.is_empty() || buf.len() < slot.report_size {
                return Err(Error::InvalidParameter);
            }
            if slot.status == InterfaceStatus::Busy {
                return Err(Error::InterfaceBusy);
            }

            let report = slot.report().ok_or(Error::NoReport)?;
            buf[..report.len()].copy_from_slice(report);
            Ok(report.len())
        })
    }

    fn status(&self, dev_addr: u8) -> InterfaceStatus {
        self.with_slots(|table| {
            table
                .get(dev_addr)
                .map_or(InterfaceStatus::InvalidRequest, |slot| slot.status)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HcdError;
    use crate::mock::{endpoint_in, MockHcd};

    fn opened(hcd: &MockHcd, dev_addr: u8) -> BootInterface {
        let itf = BootInterface::new(BootProtocol::Keyboard);
        itf.open(hcd, dev_addr, &endpoint_in(1, 8)).unwrap();
        itf
    }

    fn pipe_of(itf: &BootInterface, dev_addr: u8) -> PipeHandle {
        itf.slot(dev_addr).unwrap().pipe.unwrap()
    }

    #[test]
    fn protocol_codes() {
        assert_eq!(BootProtocol::from_code(1), Some(BootProtocol::Keyboard));
        assert_eq!(BootProtocol::from_code(2), Some(BootProtocol::Mouse));
        assert_eq!(BootProtocol::from_code(0), None);
        assert_eq!(BootProtocol::Mouse.code(), 2);
    }

    #[test]
    fn open_sets_idle_and_report_size() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);

        let slot = itf.slot(1).unwrap();
        assert_eq!(slot.status, InterfaceStatus::Idle);
        assert_eq!(slot.report_size, 8);
        assert_eq!(slot.pipe, hcd.opened().first().copied());
        assert!(itf.is_open(1));
        assert!(!itf.is_open(2));
    }

    #[test]
    fn open_failure_leaves_slot_uninitialized() {
        let hcd = MockHcd::new();
        hcd.fail_open(HcdError::NoResources);
        let itf = BootInterface::new(BootProtocol::Keyboard);

        assert_eq!(
            itf.open(&hcd, 1, &endpoint_in(1, 8)),
            Err(Error::TransportOpenFailed(HcdError::NoResources))
        );
        assert_eq!(itf.slot(1), Some(DeviceSlot::EMPTY));
    }

    #[test]
    fn open_rejects_unusable_endpoints_and_bad_address() {
        let hcd = MockHcd::new();
        let itf = BootInterface::new(BootProtocol::Keyboard);
        let mut out_ep = endpoint_in(1, 8);
        out_ep.address = 0x01;

        assert_eq!(itf.open(&hcd, 1, &out_ep), Err(Error::InvalidParameter));
        assert_eq!(
            itf.open(&hcd, 1, &endpoint_in(1, MAX_REPORT_SIZE as u16 + 1)),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            itf.open(&hcd, 0, &endpoint_in(1, 8)),
            Err(Error::InvalidParameter)
        );
        assert!(hcd.opened().is_empty());
    }

    #[test]
    fn open_twice_is_rejected() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        assert_eq!(
            itf.open(&hcd, 1, &endpoint_in(1, 8)),
            Err(Error::InvalidParameter)
        );
        assert_eq!(hcd.opened().len(), 1);
    }

    #[test]
    fn request_submits_report_size_without_a_buffer() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);

        itf.request_report(&hcd, 1).unwrap();
        assert_eq!(hcd.submitted(), [(pipe_of(&itf, 1), 8)]);
        assert_eq!(itf.status(1), InterfaceStatus::Busy);
    }

    #[test]
    fn report_lands_in_slot_after_request_scope_ends() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        let pipe = pipe_of(&itf, 1);

        {
            itf.request_report(&hcd, 1).unwrap();
        }
        assert_eq!(itf.read_report(1, &mut [0u8; 8]), Err(Error::InterfaceBusy));

        // The controller delivers later, from its own memory
        let received = [0x01, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(itf.on_transfer_event(pipe, XferEvent::Complete, &received));

        let mut buf = [0u8; 8];
        assert_eq!(itf.read_report(1, &mut buf), Ok(8));
        assert_eq!(buf, received);
    }

    #[test]
    fn request_from_terminal_state_goes_busy_again() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        let pipe = pipe_of(&itf, 1);

        itf.request_report(&hcd, 1).unwrap();
        assert!(itf.on_transfer_event(pipe, XferEvent::Error, &[]));
        assert_eq!(itf.status(1), InterfaceStatus::Error);
        assert_eq!(itf.read_report(1, &mut [0u8; 8]), Err(Error::NoReport));

        itf.request_report(&hcd, 1).unwrap();
        assert_eq!(itf.status(1), InterfaceStatus::Busy);
        assert_eq!(hcd.submitted().len(), 2);
    }

    #[test]
    fn new_request_drops_previous_report() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        let pipe = pipe_of(&itf, 1);

        itf.request_report(&hcd, 1).unwrap();
        itf.on_transfer_event(pipe, XferEvent::Complete, &[0x04; 8]);
        itf.request_report(&hcd, 1).unwrap();
        itf.on_transfer_event(pipe, XferEvent::Stalled, &[]);

        assert_eq!(itf.status(1), InterfaceStatus::Error);
        assert_eq!(itf.read_report(1, &mut [0u8; 8]), Err(Error::NoReport));
    }

    #[test]
    fn submit_failure_keeps_status_and_report() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        let pipe = pipe_of(&itf, 1);
        itf.request_report(&hcd, 1).unwrap();
        itf.on_transfer_event(pipe, XferEvent::Complete, &[0x02; 8]);

        hcd.fail_xfer(HcdError::Rejected);
        assert_eq!(
            itf.request_report(&hcd, 1),
            Err(Error::TransportSubmitFailed(HcdError::Rejected))
        );
        assert_eq!(itf.status(1), InterfaceStatus::Complete);
        assert_eq!(itf.read_report(1, &mut [0u8; 8]), Ok(8));
    }

    #[test]
    fn read_report_checks_buffer_before_state() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);

        assert_eq!(itf.read_report(1, &mut []), Err(Error::InvalidParameter));
        assert_eq!(itf.read_report(1, &mut [0u8; 7]), Err(Error::InvalidParameter));
        assert_eq!(itf.read_report(1, &mut [0u8; 8]), Err(Error::NoReport));
        assert_eq!(itf.read_report(2, &mut [0u8; 8]), Err(Error::DeviceNotReady));
        assert_eq!(itf.status(1), InterfaceStatus::Idle);
    }

    #[test]
    fn short_packet_is_reported_as_received() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        itf.request_report(&hcd, 1).unwrap();
        itf.on_transfer_event(pipe_of(&itf, 1), XferEvent::Complete, &[0xAA, 0xBB]);

        let mut buf = [0u8; 16];
        assert_eq!(itf.read_report(1, &mut buf), Ok(2));
        assert_eq!(&buf[..3], &[0xAA, 0xBB, 0x00]);
    }

    /// Controller that completes synchronously from inside `pipe_xfer`.
    struct ReentrantHcd<'a> {
        inner: MockHcd,
        driver: &'a BootInterface,
    }

    impl HostController for ReentrantHcd<'_> {
        fn pipe_open(
            &self,
            dev_addr: u8,
            endpoint: &EndpointDescriptor,
            class: ClassCode,
        ) -> Result<PipeHandle, crate::error::HcdError> {
            self.inner.pipe_open(dev_addr, endpoint, class)
        }

        fn pipe_close(&self, pipe: PipeHandle) -> Result<(), crate::error::HcdError> {
            self.inner.pipe_close(pipe)
        }

        fn pipe_xfer(
            &self,
            pipe: PipeHandle,
            _len: usize,
            _dir: Direction,
        ) -> Result<(), crate::error::HcdError> {
            self.driver.on_transfer_event(pipe, XferEvent::Complete, &[0; 8]);
            Ok(())
        }
    }

    #[test]
    #[should_panic]
    fn completion_from_inside_submit_panics() {
        let itf = BootInterface::new(BootProtocol::Keyboard);
        let hcd = ReentrantHcd {
            inner: MockHcd::new(),
            driver: &itf,
        };
        itf.open(&hcd, 1, &endpoint_in(1, 8)).unwrap();
        let _ = itf.request_report(&hcd, 1);
    }

    #[test]
    fn close_failure_still_clears_slot() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        hcd.fail_close(HcdError::InvalidPipe);

        itf.close(&hcd, 1);
        assert_eq!(itf.slot(1), Some(DeviceSlot::EMPTY));
        assert_eq!(itf.report_size(1), None);
    }

    #[test]
    fn close_is_idempotent() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);

        itf.close(&hcd, 1);
        itf.close(&hcd, 1);
        itf.close(&hcd, 0);
        assert_eq!(hcd.closed().len(), 1);
    }

    #[test]
    fn init_forgets_all_slots() {
        let hcd = MockHcd::new();
        let itf = opened(&hcd, 1);
        itf.open(&hcd, 2, &endpoint_in(1, 4)).unwrap();

        itf.init();
        assert!(!itf.is_open(1));
        assert!(!itf.is_open(2));
        assert_eq!(itf.status(2), InterfaceStatus::Uninitialized);
    }
}
