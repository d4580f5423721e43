//! USB descriptor types and a validating descriptor-chain reader.
//!
//! The interface opener receives the configuration descriptor positioned
//! at an interface descriptor and walks the chain:
//!
//! ```text
//! [Interface (9)] [HID class (9+)] [Endpoint (7)]
//! ```
//!
//! Every descriptor starts with the standard header (byte 0 = bLength,
//! byte 1 = bDescriptorType).  [`DescriptorReader`] checks the declared
//! length against the remaining bytes and the declared type against the
//! expected one before it advances.  All multi-byte fields are
//! little-endian.

use crate::config::{
    DESC_OFFSET_LENGTH, DESC_OFFSET_TYPE, ENDPOINT_DESC_LEN, HID_DESC_MIN_LEN, INTERFACE_DESC_LEN,
};
use crate::error::Error;

/// `bDescriptorType` codes used by this driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorType {
    Device,
    Configuration,
    String,
    Interface,
    Endpoint,
    /// HID class descriptor.
    Hid,
    /// HID report descriptor.
    Report,
    Unknown(u8),
}

impl From<u8> for DescriptorType {
    fn from(code: u8) -> Self {
        match code {
            0x01 => DescriptorType::Device,
            0x02 => DescriptorType::Configuration,
            0x03 => DescriptorType::String,
            0x04 => DescriptorType::Interface,
            0x05 => DescriptorType::Endpoint,
            0x21 => DescriptorType::Hid,
            0x22 => DescriptorType::Report,
            other => DescriptorType::Unknown(other),
        }
    }
}

impl From<DescriptorType> for u8 {
    fn from(kind: DescriptorType) -> u8 {
        match kind {
            DescriptorType::Device => 0x01,
            DescriptorType::Configuration => 0x02,
            DescriptorType::String => 0x03,
            DescriptorType::Interface => 0x04,
            DescriptorType::Endpoint => 0x05,
            DescriptorType::Hid => 0x21,
            DescriptorType::Report => 0x22,
            DescriptorType::Unknown(code) => code,
        }
    }
}

/// Cursor over a descriptor chain.
#[derive(Clone, Debug)]
pub struct DescriptorReader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> DescriptorReader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    /// Bytes not yet walked.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Sum of the declared lengths of every descriptor read so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Type of the next descriptor, if a full header is present.
    pub fn peek_type(&self) -> Option<DescriptorType> {
        self.buf.get(DESC_OFFSET_TYPE).map(|&t| DescriptorType::from(t))
    }

    /// Read the next descriptor, requiring it to be of type `kind`.
    ///
    /// Returns the descriptor bytes (exactly `bLength` long).  On any
    /// mismatch the cursor does not move.
    pub fn expect(&mut self, kind: DescriptorType) -> Result<&'a [u8], Error> {
        if self.buf.len() <= DESC_OFFSET_TYPE {
            warn!("Descriptor chain truncated ({} bytes left)", self.buf.len());
            return Err(Error::InvalidParameter);
        }

        let len = self.buf[DESC_OFFSET_LENGTH] as usize;
        let found = DescriptorType::from(self.buf[DESC_OFFSET_TYPE]);

        if found != kind {
            warn!("Expected {:?} descriptor, found {:?}", kind, found);
            return Err(Error::InvalidParameter);
        }
        if len <= DESC_OFFSET_TYPE || len > self.buf.len() {
            warn!("Bad bLength {} ({} bytes left)", len, self.buf.len());
            return Err(Error::InvalidParameter);
        }

        let (desc, rest) = self.buf.split_at(len);
        self.buf = rest;
        self.consumed += len;
        Ok(desc)
    }
}

/// Standard interface descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceDescriptor {
    pub length: u8,
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub string_index: u8,
}

impl InterfaceDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < INTERFACE_DESC_LEN {
            return Err(Error::InvalidParameter);
        }
        Ok(Self {
            length: data[0],
            interface_number: data[2],
            alternate_setting: data[3],
            num_endpoints: data[4],
            class: data[5],
            subclass: data[6],
            protocol: data[7],
            string_index: data[8],
        })
    }
}

/// HID class descriptor (only the first class descriptor entry is kept).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidClassDescriptor {
    pub length: u8,
    /// HID spec release, BCD.
    pub bcd_hid: u16,
    pub country_code: u8,
    pub num_descriptors: u8,
    /// Type of the first class descriptor (normally Report).
    pub report_type: u8,
    /// Length of the report descriptor the device would return.
    pub report_length: u16,
}

impl HidClassDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < HID_DESC_MIN_LEN {
            return Err(Error::InvalidParameter);
        }
        Ok(Self {
            length: data[0],
            bcd_hid: u16::from_le_bytes([data[2], data[3]]),
            country_code: data[4],
            num_descriptors: data[5],
            report_type: data[6],
            report_length: u16::from_le_bytes([data[7], data[8]]),
        })
    }
}

/// Endpoint transfer type (`bmAttributes` bits 1:0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

/// Standard endpoint descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointDescriptor {
    pub length: u8,
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < ENDPOINT_DESC_LEN {
            return Err(Error::InvalidParameter);
        }
        Ok(Self {
            length: data[0],
            address: data[2],
            attributes: data[3],
            max_packet_size: u16::from_le_bytes([data[4], data[5]]),
            interval: data[6],
        })
    }

    /// Endpoint number without the direction bit.
    pub fn number(&self) -> u8 {
        self.address & 0x0F
    }

    /// `true` for device-to-host endpoints.
    pub fn is_in(&self) -> bool {
        self.address & 0x80 != 0
    }

    pub fn transfer_type(&self) -> TransferType {
        match self.attributes & 0x03 {
            0 => TransferType::Control,
            1 => TransferType::Isochronous,
            2 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }

    /// Packet size in bytes (bits 10:0; the high-bandwidth multiplier
    /// bits are dropped).
    pub fn packet_size(&self) -> usize {
        (self.max_packet_size & 0x07FF) as usize
    }
}
