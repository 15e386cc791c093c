//! Core types for netcalc (IPv4 subnet calculator)
//!
//! This crate provides the foundational types used by the other netcalc crates:
//! - [`Ipv4Address`] - IPv4 address with dotted-quad / integer conversion
//! - [`IpClass`] - Legacy classful label (A-E)
//! - [`NetcalcError`] - Error types
//! - [`config::Settings`] - Environment configuration
//!
//! ```
//! use netcalc_core::Ipv4Address;
//!
//! let addr = Ipv4Address::parse("192.168.1.1").unwrap();
//! assert_eq!(addr.to_integer(), 3232235777);
//! assert_eq!(addr.to_string(), "192.168.1.1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

pub mod config;

/// IPv4 address
///
/// The 32-bit integer is the canonical value; the four octets are its
/// big-endian bytes. Any `u32` is a valid address.
///
/// # Examples
///
/// ```
/// use netcalc_core::Ipv4Address;
///
/// let addr = Ipv4Address::from_octets([10, 0, 0, 1]);
/// assert_eq!(addr.to_integer(), 0x0A000001);
/// assert_eq!(Ipv4Address::from_integer(0x0A000001), addr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ipv4Address(u32);

impl Ipv4Address {
    /// Parse a dotted-quad address
    ///
    /// Requires exactly four `.`-separated fields, each made only of ASCII
    /// digits with a value in 0-255.
    ///
    /// # Errors
    ///
    /// * [`NetcalcError::InvalidFormat`] if the field count is not 4
    /// * [`NetcalcError::OctetOutOfRange`] if a field is not a decimal number
    ///   in 0-255
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split('.').collect();
        if fields.len() != 4 {
            return Err(NetcalcError::InvalidFormat(format!(
                "expected 4 octets in '{}', found {}",
                text,
                fields.len()
            )));
        }

        let mut value = 0u32;
        for (i, field) in fields.iter().enumerate() {
            value |= parse_octet(field)? << (24 - i * 8);
        }

        Ok(Self(value))
    }

    /// Build an address from its 32-bit form
    pub const fn from_integer(value: u32) -> Self {
        Self(value)
    }

    /// Build an address from four octets, most significant first
    pub const fn from_octets(octets: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(octets))
    }

    /// Pack the octets big-endian into a `u32`
    pub const fn to_integer(self) -> u32 {
        self.0
    }

    /// The four octets, most significant first
    pub const fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Dotted-quad text form, same as `to_string()`
    pub fn format(self) -> String {
        self.to_string()
    }

    /// Binary-octet form, e.g. `11000000.10101000.00000001.00000001`
    pub fn to_binary(self) -> String {
        let [a, b, c, d] = self.octets();
        format!("{:08b}.{:08b}.{:08b}.{:08b}", a, b, c, d)
    }

    /// Classful label derived from the first octet
    pub fn class(self) -> IpClass {
        IpClass::from_first_octet(self.octets()[0])
    }
}

fn parse_octet(field: &str) -> Result<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NetcalcError::OctetOutOfRange(format!(
            "'{}' is not a decimal octet",
            field
        )));
    }

    match field.parse::<u32>() {
        Ok(octet) if octet <= 255 => Ok(octet),
        _ => Err(NetcalcError::OctetOutOfRange(format!(
            "{} is outside 0-255",
            field
        ))),
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl FromStr for Ipv4Address {
    type Err = NetcalcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u32> for Ipv4Address {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Ipv4Address> for u32 {
    fn from(addr: Ipv4Address) -> Self {
        addr.0
    }
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Self(u32::from(addr))
    }
}

impl From<Ipv4Address> for Ipv4Addr {
    fn from(addr: Ipv4Address) -> Self {
        Ipv4Addr::from(addr.0)
    }
}

impl From<Ipv4Address> for String {
    fn from(addr: Ipv4Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Ipv4Address {
    type Error = NetcalcError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

/// Legacy classful address label
///
/// Informational only; derived from the first octet of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpClass {
    A,
    B,
    C,
    D,
    E,
}

impl IpClass {
    /// Classify by first octet: `<128` A, `<192` B, `<224` C, `<240` D, else E
    pub fn from_first_octet(octet: u8) -> Self {
        match octet {
            0..=127 => IpClass::A,
            128..=191 => IpClass::B,
            192..=223 => IpClass::C,
            224..=239 => IpClass::D,
            _ => IpClass::E,
        }
    }
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IpClass::A => "A",
            IpClass::B => "B",
            IpClass::C => "C",
            IpClass::D => "D",
            IpClass::E => "E",
        };
        f.write_str(label)
    }
}

/// Error types for netcalc operations
///
/// Every variant is a user-correctable input mistake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetcalcError {
    /// Input does not have the dotted-quad (optional `/prefix`) shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An octet is not a decimal number in 0-255
    #[error("Octet out of range: {0}")]
    OctetOutOfRange(String),

    /// Prefix length outside 0-32
    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefix(u32),

    /// Range start after end, or an endpoint failed to parse
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Bad environment configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for netcalc operations
pub type Result<T> = std::result::Result<T, NetcalcError>;
