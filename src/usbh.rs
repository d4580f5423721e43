//! Enumeration-layer collaborator contract.

/// Enumeration state of a device address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    Unplugged,
    Addressed,
    Configured,
    Removing,
}

/// Device-state queries answered by the enumeration layer.
pub trait DeviceRegistry {
    fn device_state(&self, dev_addr: u8) -> DeviceState;

    fn is_configured(&self, dev_addr: u8) -> bool {
        self.device_state(dev_addr) == DeviceState::Configured
    }
}
