//! Subnet analysis
//!
//! Turns `address[/prefix]` input into a [`SubnetReport`]: network and
//! broadcast addresses, usable host range, masks, class and the adjacent
//! blocks of the same size.

use crate::{check_prefix, parse_prefix, Cidr};
use lazy_static::lazy_static;
use netcalc_core::config::DEFAULT_PREFIX;
use netcalc_core::{IpClass, Ipv4Address, NetcalcError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

lazy_static! {
    static ref SUBNET_INPUT: Regex =
        Regex::new(r"^[0-9]{1,3}(\.[0-9]{1,3})*(/[0-9]{1,2})?$").expect("Invalid Regex");
    static ref ADDRESS_INPUT: Regex =
        Regex::new(r"^[0-9]{1,3}(\.[0-9]{1,3})*$").expect("Invalid Regex");
}

/// Everything known about the subnet containing an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetReport {
    /// Normalized input (`address/prefix`)
    pub input: String,
    /// Address as given (host bits kept)
    pub address: Ipv4Address,
    pub prefix_len: u8,
    /// Containing block
    pub cidr: Cidr,
    pub subnet_mask: Ipv4Address,
    pub wildcard_mask: Ipv4Address,
    pub network: Ipv4Address,
    pub broadcast: Ipv4Address,
    pub first_usable: Ipv4Address,
    pub last_usable: Ipv4Address,
    /// Usable hosts; `/31` counts 2 and `/32` counts 1
    pub host_count: u64,
    pub total_addresses: u64,
    /// Class of the original address, not the network address
    pub class: IpClass,
    /// `None` below `0.0.0.0`
    pub previous_block: Option<Cidr>,
    /// `None` above `255.255.255.255`
    pub next_block: Option<Cidr>,
    pub address_binary: String,
    pub subnet_mask_binary: String,
    pub network_binary: String,
    pub broadcast_binary: String,
}

/// Analyze `address[/prefix]` text, using /24 when the prefix is omitted
///
/// # Examples
///
/// ```
/// use netcalc_cidr::analyze;
///
/// let report = analyze("192.168.1.0/24").unwrap();
/// assert_eq!(report.broadcast.to_string(), "192.168.1.255");
/// assert_eq!(report.host_count, 254);
/// ```
pub fn analyze(input: &str) -> Result<SubnetReport> {
    analyze_with_default(input, DEFAULT_PREFIX)
}

/// Analyze `address[/prefix]` text with a caller-chosen default prefix
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// * [`NetcalcError::InvalidFormat`] if the text is not digit groups
///   separated by dots with an optional `/` and 1-2 digits, or has other
///   than four groups
/// * [`NetcalcError::OctetOutOfRange`] if a group exceeds 255
/// * [`NetcalcError::InvalidPrefix`] if the prefix (or default) exceeds 32
pub fn analyze_with_default(input: &str, default_prefix: u8) -> Result<SubnetReport> {
    let input = input.trim();
    if !SUBNET_INPUT.is_match(input) {
        debug!(input, "rejected subnet input");
        return Err(NetcalcError::InvalidFormat(format!(
            "expected a.b.c.d[/prefix], got '{}'",
            input
        )));
    }

    let (address_text, prefix_text) = match input.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (input, None),
    };

    let address = Ipv4Address::parse(address_text)?;
    let prefix = match prefix_text {
        Some(text) => parse_prefix(text)?,
        None => check_prefix(u32::from(default_prefix))?,
    };

    subnet_report(address, prefix)
}

/// Analyze an address and prefix supplied as separate fields
///
/// A missing prefix defaults to /24.
///
/// ```
/// use netcalc_cidr::analyze_parts;
///
/// let report = analyze_parts("10.0.0.5", Some(8)).unwrap();
/// assert_eq!(report.network.to_string(), "10.0.0.0");
/// ```
pub fn analyze_parts(address: &str, prefix: Option<u8>) -> Result<SubnetReport> {
    let address = address.trim();
    if !ADDRESS_INPUT.is_match(address) {
        debug!(address, "rejected address input");
        return Err(NetcalcError::InvalidFormat(format!(
            "expected a.b.c.d, got '{}'",
            address
        )));
    }

    let address = Ipv4Address::parse(address)?;
    let prefix = check_prefix(u32::from(prefix.unwrap_or(DEFAULT_PREFIX)))?;

    subnet_report(address, prefix)
}

/// Build the report for an already parsed address
pub fn subnet_report(address: Ipv4Address, prefix: u8) -> Result<SubnetReport> {
    let cidr = Cidr::new(address.to_integer(), prefix)?;

    let subnet_mask = Ipv4Address::from_integer(cidr.mask());
    let network = Ipv4Address::from_integer(cidr.network());
    let broadcast = Ipv4Address::from_integer(cidr.broadcast());

    let report = SubnetReport {
        input: format!("{}/{}", address, prefix),
        address,
        prefix_len: prefix,
        cidr,
        subnet_mask,
        wildcard_mask: Ipv4Address::from_integer(cidr.wildcard()),
        network,
        broadcast,
        first_usable: Ipv4Address::from_integer(cidr.first_usable()),
        last_usable: Ipv4Address::from_integer(cidr.last_usable()),
        host_count: cidr.usable_hosts(),
        total_addresses: cidr.size(),
        class: address.class(),
        previous_block: cidr.previous_block(),
        next_block: cidr.next_block(),
        address_binary: address.to_binary(),
        subnet_mask_binary: subnet_mask.to_binary(),
        network_binary: network.to_binary(),
        broadcast_binary: broadcast.to_binary(),
    };

    debug!(input = %report.input, cidr = %report.cidr, hosts = report.host_count, "analyzed subnet");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(text: &str) -> Ipv4Address {
        Ipv4Address::parse(text).unwrap()
    }

    #[test]
    fn test_analyze_slash_24() {
        let report = analyze("192.168.1.0/24").unwrap();
        assert_eq!(report.network, addr("192.168.1.0"));
        assert_eq!(report.broadcast, addr("192.168.1.255"));
        assert_eq!(report.first_usable, addr("192.168.1.1"));
        assert_eq!(report.last_usable, addr("192.168.1.254"));
        assert_eq!(report.subnet_mask, addr("255.255.255.0"));
        assert_eq!(report.wildcard_mask, addr("0.0.0.255"));
        assert_eq!(report.host_count, 254);
        assert_eq!(report.total_addresses, 256);
        assert_eq!(report.class, IpClass::C);
    }

    #[test]
    fn test_analyze_slash_8() {
        let report = analyze("10.0.0.5/8").unwrap();
        assert_eq!(report.network, addr("10.0.0.0"));
        assert_eq!(report.broadcast, addr("10.255.255.255"));
        assert_eq!(report.class, IpClass::A);
        assert_eq!(report.host_count, 16777214);
    }

    #[test]
    fn test_default_prefix() {
        let report = analyze("172.16.5.9").unwrap();
        assert_eq!(report.prefix_len, 24);
        assert_eq!(report.cidr.to_string(), "172.16.5.0/24");
        assert_eq!(report.input, "172.16.5.9/24");

        let report = analyze_with_default("172.16.5.9", 16).unwrap();
        assert_eq!(report.cidr.to_string(), "172.16.0.0/16");
    }

    #[test]
    fn test_class_uses_original_address() {
        // 191.255.0.1/1 has network 128.0.0.0, still class B
        let report = analyze("191.255.0.1/1").unwrap();
        assert_eq!(report.network, addr("128.0.0.0"));
        assert_eq!(report.class, IpClass::B);

        // 223.1.1.1/0 has network 0.0.0.0 (class A) but the address is class C
        let report = analyze("223.1.1.1/0").unwrap();
        assert_eq!(report.network, addr("0.0.0.0"));
        assert_eq!(report.class, IpClass::C);
    }

    #[test]
    fn test_adjacent_blocks() {
        let report = analyze("192.168.1.77/26").unwrap();
        assert_eq!(report.cidr.to_string(), "192.168.1.64/26");
        assert_eq!(report.previous_block.unwrap().to_string(), "192.168.1.0/26");
        assert_eq!(report.next_block.unwrap().to_string(), "192.168.1.128/26");
    }

    #[test]
    fn test_adjacent_blocks_at_edges() {
        let report = analyze("0.0.0.1/24").unwrap();
        assert!(report.previous_block.is_none());
        assert!(report.next_block.is_some());

        let report = analyze("255.255.255.1/24").unwrap();
        assert!(report.previous_block.is_some());
        assert!(report.next_block.is_none());
    }

    #[test]
    fn test_point_to_point_and_host_routes() {
        let report = analyze("10.1.1.1/31").unwrap();
        assert_eq!(report.first_usable, addr("10.1.1.0"));
        assert_eq!(report.last_usable, addr("10.1.1.1"));
        assert_eq!(report.host_count, 2);

        let report = analyze("10.1.1.1/32").unwrap();
        assert_eq!(report.network, addr("10.1.1.1"));
        assert_eq!(report.broadcast, addr("10.1.1.1"));
        assert_eq!(report.first_usable, addr("10.1.1.1"));
        assert_eq!(report.last_usable, addr("10.1.1.1"));
        assert_eq!(report.host_count, 1);
        assert_eq!(report.next_block.unwrap().to_string(), "10.1.1.2/32");
    }

    #[test]
    fn test_whole_space() {
        let report = analyze("8.8.8.8/0").unwrap();
        assert_eq!(report.subnet_mask, addr("0.0.0.0"));
        assert_eq!(report.broadcast, addr("255.255.255.255"));
        assert_eq!(report.host_count, (1u64 << 32) - 2);
        assert!(report.previous_block.is_none());
        assert!(report.next_block.is_none());
    }

    #[test]
    fn test_binary_fields() {
        let report = analyze("192.168.1.1/24").unwrap();
        assert_eq!(report.address_binary, "11000000.10101000.00000001.00000001");
        assert_eq!(report.subnet_mask_binary, "11111111.11111111.11111111.00000000");
        assert_eq!(report.network_binary, "11000000.10101000.00000001.00000000");
        assert_eq!(report.broadcast_binary, "11000000.10101000.00000001.11111111");
    }

    #[test]
    fn test_octet_out_of_range() {
        assert!(matches!(
            analyze("999.1.1.1/24"),
            Err(NetcalcError::OctetOutOfRange(_))
        ));
    }

    #[test]
    fn test_invalid_format() {
        for bad in [
            "",
            "abc",
            "192.168.1.0/",
            "192.168.1.0/024",
            "1234.1.1.1",
            "192.168.1.0/24/8",
            "192.168.1",
            "1.2.3.4.5/8",
            "192.168.1.0 /24",
        ] {
            assert!(
                matches!(analyze(bad), Err(NetcalcError::InvalidFormat(_))),
                "{:?} should be InvalidFormat",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(matches!(
            analyze("10.0.0.0/33"),
            Err(NetcalcError::InvalidPrefix(33))
        ));
        assert!(matches!(
            analyze_with_default("10.0.0.0", 40),
            Err(NetcalcError::InvalidPrefix(40))
        ));
    }

    #[test]
    fn test_surrounding_whitespace() {
        let report = analyze("  10.0.0.1/30\n").unwrap();
        assert_eq!(report.input, "10.0.0.1/30");
    }

    #[test]
    fn test_analyze_parts() {
        let report = analyze_parts("192.168.10.20", Some(28)).unwrap();
        assert_eq!(report.cidr.to_string(), "192.168.10.16/28");
        assert_eq!(report.host_count, 14);

        let report = analyze_parts("192.168.10.20", None).unwrap();
        assert_eq!(report.prefix_len, 24);

        assert!(matches!(
            analyze_parts("192.168.10.20/24", Some(24)),
            Err(NetcalcError::InvalidFormat(_))
        ));
        assert!(matches!(
            analyze_parts("192.168.10.20", Some(33)),
            Err(NetcalcError::InvalidPrefix(33))
        ));
    }

    #[test]
    fn test_idempotent() {
        let first = analyze("172.20.3.4/19").unwrap();
        let second = analyze("172.20.3.4/19").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = analyze("192.168.1.0/24").unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).expect("serialization failed");
        assert_eq!(json["network"], "192.168.1.0");
        assert_eq!(json["cidr"], "192.168.1.0/24");
        assert_eq!(json["class"], "C");
        assert_eq!(json["host_count"], 254);
        assert_eq!(json["next_block"], "192.168.2.0/24");

        let back: SubnetReport = serde_json::from_value(json).expect("deserialization failed");
        assert_eq!(back, report);
    }
}
