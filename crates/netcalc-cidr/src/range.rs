//! Range expansion
//!
//! Expands an arbitrary `start..=end` address range outward to the smallest
//! power-of-two aligned CIDR block that contains all of it.

use crate::{prefix_mask, Cidr, MAX_PREFIX};
use netcalc_core::{Ipv4Address, NetcalcError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of expanding a range to an aligned block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
    pub start: Ipv4Address,
    pub end: Ipv4Address,
    /// `end - start + 1`
    pub requested_size: u64,
    pub prefix_len: u8,
    pub subnet_mask: Ipv4Address,
    pub aligned_start: Ipv4Address,
    pub aligned_end: Ipv4Address,
    /// Size of the aligned block, at least `requested_size`
    pub addresses_in_range: u64,
    pub cidr: Cidr,
}

/// Expand the range between two dotted-quad addresses
///
/// # Errors
///
/// [`NetcalcError::InvalidRange`] if either address fails to parse or
/// `start` is greater than `end`.
///
/// # Examples
///
/// ```
/// use netcalc_cidr::expand_range;
///
/// let report = expand_range("192.168.1.10", "192.168.1.20").unwrap();
/// assert_eq!(report.cidr.to_string(), "192.168.1.0/27");
/// assert_eq!(report.aligned_end.to_string(), "192.168.1.31");
/// ```
pub fn expand_range(start: &str, end: &str) -> Result<RangeReport> {
    let start = parse_endpoint(start, "start")?;
    let end = parse_endpoint(end, "end")?;

    expand(start, end)
}

fn parse_endpoint(text: &str, which: &str) -> Result<Ipv4Address> {
    Ipv4Address::parse(text.trim()).map_err(|e| {
        debug!(input = text, "rejected range endpoint");
        NetcalcError::InvalidRange(format!("{} address '{}': {}", which, text.trim(), e))
    })
}

/// Expand an already parsed range
pub fn expand(start: Ipv4Address, end: Ipv4Address) -> Result<RangeReport> {
    if start > end {
        return Err(NetcalcError::InvalidRange(format!(
            "start {} is after end {}",
            start, end
        )));
    }

    let (first, last) = (start.to_integer(), end.to_integer());
    let requested_size = u64::from(last - first) + 1;

    // Smallest block that could hold the range, then widen until the
    // block aligned under `start` also reaches `end`.
    let size_prefix = MAX_PREFIX - ceil_log2(requested_size);
    let common_prefix = (first ^ last).leading_zeros() as u8;
    let prefix = size_prefix.min(common_prefix);
    if prefix < size_prefix {
        debug!(size_prefix, prefix, "range straddles block boundary, widening");
    }

    let mask = prefix_mask(prefix);
    let cidr = Cidr::new(first, prefix)?;
    let aligned_start = cidr.network();
    let aligned_end = aligned_start | !mask;

    let report = RangeReport {
        start,
        end,
        requested_size,
        prefix_len: prefix,
        subnet_mask: Ipv4Address::from_integer(mask),
        aligned_start: Ipv4Address::from_integer(aligned_start),
        aligned_end: Ipv4Address::from_integer(aligned_end),
        addresses_in_range: u64::from(aligned_end - aligned_start) + 1,
        cidr,
    };

    debug!(%start, %end, cidr = %report.cidr, "expanded range");

    Ok(report)
}

/// `ceil(log2(n))` for `1 <= n <= 2^32`
fn ceil_log2(n: u64) -> u8 {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()) as u8
    }
}
