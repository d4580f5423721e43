//! HID class driver front-end.
//!
//! [`HidHost`] is what the rest of the host stack talks to:
//!
//! - the enumeration layer calls [`HidHost::open`] for every HID
//!   interface it finds and [`HidHost::close`] on disconnect,
//! - the host controller calls [`HidHost::on_transfer_event`] from its
//!   interrupt handler when a transfer finishes,
//! - the application polls boot interfaces through an
//!   [`InterfaceHandle`] (`keyboard()`, `mouse()`).
//!
//! Per-protocol state lives in the registered [`BootDriver`]s.


use heapless::Vec;

use crate::boot::{BootDriver, BootProtocol};
use crate::config::{CLASS_HID, HID_SUBCLASS_BOOT, MAX_BOOT_DRIVERS, MAX_REPORT_SIZE};
use crate::descriptor::{
    DescriptorReader, DescriptorType, EndpointDescriptor, HidClassDescriptor, InterfaceDescriptor,
};
use crate::error::Error;
use crate::hcd::{HostController, PipeHandle, XferEvent};
use crate::keyboard::KeyboardReport;
use crate::mouse::MouseReport;
use crate::slot::InterfaceStatus;
use crate::usbh::DeviceRegistry;

/// Boot drivers compiled in through Cargo features.
static BUILTIN_DRIVERS: &[&(dyn BootDriver + Sync)] = &[
    #[cfg(feature = "keyboard")]
    &crate::keyboard::KEYBOARD,
    #[cfg(feature = "mouse")]
    &crate::mouse::MOUSE,
];

pub struct HidHost<'d> {
    hcd: &'d dyn HostController,
    usbh: &'d dyn DeviceRegistry,
    drivers: Vec<&'d dyn BootDriver, MAX_BOOT_DRIVERS>,
}

impl<'d> HidHost<'d> {
    /// A host with an empty driver table.
    pub fn new(hcd: &'d dyn HostController, usbh: &'d dyn DeviceRegistry) -> Self {
        Self {
            hcd,
            usbh,
            drivers: Vec::new(),
        }
    }

    /// A host with the boot drivers selected by Cargo features
    /// (`keyboard`, `mouse`) already registered.
    pub fn with_builtin_drivers(
        hcd: &'d dyn HostController,
        usbh: &'d dyn DeviceRegistry,
    ) -> Result<Self, Error> {
        let mut host = Self::new(hcd, usbh);
        for &driver in BUILTIN_DRIVERS {
            host.register(driver)?;
        }
        Ok(host)
    }

    /// Add a boot driver to the dispatch table.
    ///
    /// One driver per protocol.
    pub fn register(&mut self, driver: &'d dyn BootDriver) -> Result<(), Error> {
        if self.driver(driver.protocol()).is_some() {
            warn!("Boot {:?} driver already registered", driver.protocol());
            return Err(Error::InvalidParameter);
        }
        self.drivers
            .push(driver)
            .map_err(|_| Error::DriverTableFull)
    }

    pub fn driver(&self, protocol: BootProtocol) -> Option<&'d dyn BootDriver> {
        self.drivers
            .iter()
            .copied()
            .find(|d| d.protocol() == protocol)
    }

    /// Reset every registered driver.  Call once before any device is
    /// attached.
    pub fn init(&self) {
        for driver in &self.drivers {
            driver.init();
        }
        info!("HID host initialised ({} boot drivers)", self.drivers.len());
    }

    /// Open the HID interface at the start of `descriptors`.
    ///
    /// `descriptors` is the configuration descriptor from the interface
    /// descriptor onwards.  Returns the number of bytes consumed
    /// (interface + HID + endpoint), or 0 when the interface is left for
    /// someone else (generic HID, unknown boot protocol, driver not
    /// compiled in).
    pub fn open(&self, dev_addr: u8, descriptors: &[u8]) -> Result<usize, Error> {
        let mut reader = DescriptorReader::new(descriptors);

        let itf = InterfaceDescriptor::parse(reader.expect(DescriptorType::Interface)?)?;
        if itf.class != CLASS_HID {
            warn!("Interface {} is class {:x}, not HID", itf.interface_number, itf.class);
            return Err(Error::InvalidParameter);
        }

        let hid = HidClassDescriptor::parse(reader.expect(DescriptorType::Hid)?)?;
        debug!(
            "HID {:x} country {} report descriptor {} bytes (not fetched)",
            hid.bcd_hid, hid.country_code, hid.report_length
        );

        let endpoint = EndpointDescriptor::parse(reader.expect(DescriptorType::Endpoint)?)?;

        if itf.subclass != HID_SUBCLASS_BOOT {
            debug!("Device {}: generic HID interface skipped", dev_addr);
            return Ok(0);
        }

        let Some(driver) = BootProtocol::from_code(itf.protocol).and_then(|p| self.driver(p))
        else {
            debug!(
                "Device {}: boot protocol {} not handled",
                dev_addr, itf.protocol
            );
            return Ok(0);
        };

        driver.open(self.hcd, dev_addr, &endpoint)?;
        info!(
            "Device {}: boot {:?} interface {} opened (ep {:x}, report {} bytes)",
            dev_addr,
            driver.protocol(),
            itf.interface_number,
            endpoint.address,
            endpoint.packet_size()
        );

        Ok(reader.consumed())
    }

    /// Transfer-completion entry point for the host controller.
    ///
    /// `data` is what the transfer received; it is copied into the
    /// owning slot before this returns.  Safe to call from interrupt
    /// context: it only takes short critical sections and never blocks.
    /// Events for pipes no driver owns are dropped.
    pub fn on_transfer_event(&self, pipe: PipeHandle, event: XferEvent, data: &[u8]) {
        for driver in &self.drivers {
            if driver.on_transfer_event(pipe, event, data) {
                return;
            }
        }
        trace!("Unclaimed transfer event {:?} on {:?}", event, pipe);
    }

    /// Release everything device `dev_addr` holds.  Idempotent.
    pub fn close(&self, dev_addr: u8) {
        for driver in &self.drivers {
            driver.close(self.hcd, dev_addr);
        }
    }

    pub fn interface(&self, protocol: BootProtocol) -> Option<InterfaceHandle<'_>> {
        self.driver(protocol)
            .map(|driver| InterfaceHandle { host: self, driver })
    }

    pub fn keyboard(&self) -> Option<InterfaceHandle<'_>> {
        self.interface(BootProtocol::Keyboard)
    }

    pub fn mouse(&self) -> Option<InterfaceHandle<'_>> {
        self.interface(BootProtocol::Mouse)
    }
}

/// Application view of one boot protocol.
///
/// Every call is gated on the enumeration layer reporting the device as
/// configured.
#[derive(Clone, Copy)]
pub struct InterfaceHandle<'a> {
    host: &'a HidHost<'a>,
    driver: &'a dyn BootDriver,
}

impl<'a> InterfaceHandle<'a> {
    pub fn protocol(&self) -> BootProtocol {
        self.driver.protocol()
    }

    /// The device is configured and has this interface open.
    pub fn is_supported(&self, dev_addr: u8) -> bool {
        self.host.usbh.is_configured(dev_addr) && self.driver.is_open(dev_addr)
    }

    /// Start reading one input report and return at once.
    ///
    /// The report lands in the device slot; fetch it with
    /// [`Self::read_report`] once [`Self::status`] is `Complete`.
    /// `instance` is reserved for devices with several interfaces of one
    /// protocol.
    pub fn request_report(&self, dev_addr: u8, instance: u8) -> Result<(), Error> {
        let _ = instance;
        if !self.host.usbh.is_configured(dev_addr) {
            return Err(Error::DeviceNotReady);
        }
        self.driver.request_report(self.host.hcd, dev_addr)
    }

    /// Copy the last completed report into `buf` and return its length.
    ///
    /// `buf` must hold at least the report size.  Fails with
    /// `InterfaceBusy` while a request is outstanding and `NoReport` when
    /// nothing has completed successfully since the last request.
    pub fn read_report(
        &self,
        dev_addr: u8,
        instance: u8,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        let _ = instance;
        if !self.host.usbh.is_configured(dev_addr) {
            return Err(Error::DeviceNotReady);
        }
        self.driver.read_report(dev_addr, buf)
    }

    /// Last completed report of a boot keyboard, decoded.
    pub fn keyboard_report(&self, dev_addr: u8) -> Option<KeyboardReport> {
        if self.protocol() != BootProtocol::Keyboard {
            return None;
        }
        let mut buf = [0u8; MAX_REPORT_SIZE];
        let len = self.read_report(dev_addr, 0, &mut buf).ok()?;
        KeyboardReport::parse(&buf[..len])
    }

    /// Last completed report of a boot mouse, decoded.
    pub fn mouse_report(&self, dev_addr: u8) -> Option<MouseReport> {
        if self.protocol() != BootProtocol::Mouse {
            return None;
        }
        let mut buf = [0u8; MAX_REPORT_SIZE];
        let len = self.read_report(dev_addr, 0, &mut buf).ok()?;
        MouseReport::parse(&buf[..len])
    }

    /// Current status, or `InvalidRequest` if the device is not
    /// configured.
    pub fn status(&self, dev_addr: u8, instance: u8) -> InterfaceStatus {
        let _ = instance;
        if !self.host.usbh.is_configured(dev_addr) {
            return InterfaceStatus::InvalidRequest;
        }
        self.driver.status(dev_addr)
    }

    pub fn report_size(&self, dev_addr: u8) -> Option<usize> {
        self.driver.report_size(dev_addr)
    }
}
