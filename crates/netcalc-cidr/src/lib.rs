//! CIDR blocks, subnet analysis and range expansion
//!
//! Provides:
//! - [`Cidr`] - a network block (`192.168.0.0/24`)
//! - [`analyze`] - full descriptive report for an address and prefix
//! - [`expand_range`] - smallest aligned block covering an address range
//!
//! # Examples
//!
//! ```
//! use netcalc_cidr::Cidr;
//!
//! let cidr = Cidr::parse("192.168.1.0/24").unwrap();
//! assert_eq!(cidr.prefix_len(), 24);
//! assert_eq!(cidr.network(), 0xC0A80100); // 192.168.1.0
//! assert!(cidr.contains(0xC0A80101)); // 192.168.1.1
//! assert!(!cidr.contains(0xC0A80001)); // 192.168.0.1
//! ```

use netcalc_core::{Ipv4Address, NetcalcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod range;
pub mod subnet;

pub use range::{expand, expand_range, RangeReport};
pub use subnet::{analyze, analyze_parts, analyze_with_default, subnet_report, SubnetReport};

/// Largest valid prefix length
pub const MAX_PREFIX: u8 = 32;

/// Subnet mask with `prefix` leading one-bits
///
/// `/0` yields `0`; prefixes above 32 are treated as 32.
///
/// ```
/// use netcalc_cidr::prefix_mask;
///
/// assert_eq!(prefix_mask(0), 0);
/// assert_eq!(prefix_mask(24), 0xFFFFFF00);
/// assert_eq!(prefix_mask(32), 0xFFFFFFFF);
/// ```
pub fn prefix_mask(prefix: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(MAX_PREFIX.saturating_sub(prefix)))
        .unwrap_or(0)
}

pub(crate) fn check_prefix(prefix: u32) -> Result<u8> {
    if prefix > u32::from(MAX_PREFIX) {
        return Err(NetcalcError::InvalidPrefix(prefix));
    }
    Ok(prefix as u8)
}

/// Parse the decimal digits after `/`
pub(crate) fn parse_prefix(text: &str) -> Result<u8> {
    let invalid = || NetcalcError::InvalidFormat(format!("invalid prefix '{}'", text));

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let prefix: u32 = text.parse().map_err(|_| invalid())?;

    check_prefix(prefix)
}

/// CIDR block representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cidr {
    /// Network address (base IP)
    network: u32,
    /// Prefix length (0-32)
    prefix_len: u8,
    /// Network mask
    mask: u32,
}

impl Cidr {
    /// Parse CIDR notation string
    ///
    /// # Arguments
    ///
    /// * `cidr` - CIDR string (e.g., "192.168.1.0/24")
    ///
    /// Host bits in the address are cleared.
    ///
    /// # Examples
    ///
    /// ```
    /// use netcalc_cidr::Cidr;
    ///
    /// let cidr = Cidr::parse("10.1.2.3/8").unwrap();
    /// assert_eq!(cidr.to_string(), "10.0.0.0/8");
    /// ```
    pub fn parse(cidr: &str) -> Result<Self> {
        let (ip_str, prefix_str) = cidr.split_once('/').ok_or_else(|| {
            NetcalcError::InvalidFormat(format!("expected a.b.c.d/prefix, got '{}'", cidr))
        })?;

        let ip = Ipv4Address::parse(ip_str)?;

        Self::new(ip.to_integer(), parse_prefix(prefix_str)?)
    }

    /// Create new CIDR from an address and prefix length
    ///
    /// # Arguments
    ///
    /// * `network` - Any address inside the block, as u32
    /// * `prefix_len` - Prefix length (0-32)
    pub fn new(network: u32, prefix_len: u8) -> Result<Self> {
        let prefix_len = check_prefix(u32::from(prefix_len))?;
        let mask = prefix_mask(prefix_len);

        Ok(Self {
            network: network & mask,
            prefix_len,
            mask,
        })
    }

    /// Get network address
    pub fn network(&self) -> u32 {
        self.network
    }

    /// Get prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Get network mask
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Get wildcard (inverse) mask
    pub fn wildcard(&self) -> u32 {
        !self.mask
    }

    /// Get broadcast address
    pub fn broadcast(&self) -> u32 {
        self.network | !self.mask
    }

    /// Get first usable IP
    ///
    /// `/31` and `/32` have no reserved network address.
    pub fn first_usable(&self) -> u32 {
        if self.prefix_len >= 31 {
            self.network
        } else {
            self.network + 1
        }
    }

    /// Get last usable IP
    ///
    /// `/31` and `/32` have no reserved broadcast address.
    pub fn last_usable(&self) -> u32 {
        if self.prefix_len >= 31 {
            self.broadcast()
        } else {
            self.broadcast() - 1
        }
    }

    /// Get total number of IPs in this CIDR block
    pub fn size(&self) -> u64 {
        1u64 << (MAX_PREFIX - self.prefix_len)
    }

    /// Number of usable host addresses
    ///
    /// `/32` has 1, `/31` has 2 (RFC 3021), everything else excludes
    /// the network and broadcast addresses.
    pub fn usable_hosts(&self) -> u64 {
        match self.prefix_len {
            32 => 1,
            31 => 2,
            _ => self.size() - 2,
        }
    }

    /// Check if IP address is in this CIDR block
    ///
    /// # Arguments
    ///
    /// * `ip` - IP address as u32
    pub fn contains(&self, ip: u32) -> bool {
        (ip & self.mask) == self.network
    }

    /// Block of the same size directly below this one
    pub fn previous_block(&self) -> Option<Self> {
        let size = u32::try_from(self.size()).ok()?;
        let network = self.network.checked_sub(size)?;
        Some(Self { network, ..*self })
    }

    /// Block of the same size directly above this one
    pub fn next_block(&self) -> Option<Self> {
        let network = self.broadcast().checked_add(1)?;
        Some(Self { network, ..*self })
    }

    /// Get iterator over all IPs in this CIDR block
    ///
    /// Note: For large blocks (e.g., /8), this may be very slow.
    /// Consider using contains() or checking ranges instead.
    pub fn iter(&self) -> CidrIterator {
        CidrIterator::new(*self)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            Ipv4Address::from_integer(self.network),
            self.prefix_len
        )
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> Self {
        cidr.to_string()
    }
}

impl TryFrom<String> for Cidr {
    type Error = NetcalcError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

/// Iterator over IPs in a CIDR block
pub struct CidrIterator {
    current: u64,
    end: u64,
}

impl CidrIterator {
    fn new(cidr: Cidr) -> Self {
        Self {
            current: u64::from(cidr.network()),
            end: u64::from(cidr.broadcast()),
        }
    }
}

impl Iterator for CidrIterator {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current <= self.end {
            let ip = self.current as u32;
            self.current += 1;
            Some(ip)
        } else {
            None
        }
    }
}
