// Private address-space classification

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// RFC1918, shared address space (RFC6598), loopback, and link-local.
const PRIVATE_V4_PREFIXES: [(Ipv4Addr, u8); 6] = [
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
];

// ULA, link-local, and loopback.
const PRIVATE_V6_PREFIXES: [(Ipv6Addr, u8); 3] = [
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
    (Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1), 128),
];

/// Check whether an address string falls inside the private address space.
///
/// Unparseable or empty input classifies as not private, so malformed
/// strings are never treated as private-network traffic.
pub fn is_private_address(address: &str) -> bool {
    let ip: IpAddr = match address.trim().parse() {
        Ok(ip) => ip,
        Err(_) => return false,
    };

    match ip {
        IpAddr::V4(addr) => PRIVATE_V4_PREFIXES
            .iter()
            .any(|&(network, prefix_len)| ip_v4_in_prefix(network, addr, prefix_len)),
        IpAddr::V6(addr) => PRIVATE_V6_PREFIXES
            .iter()
            .any(|&(network, prefix_len)| ip_v6_in_prefix(network, addr, prefix_len)),
    }
}

fn ip_v4_in_prefix(network: Ipv4Addr, addr: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    if prefix_len > 32 {
        return false;
    }

    let network_bits = u32::from(network);
    let addr_bits = u32::from(addr);

    let mask = if prefix_len == 32 {
        0xFFFFFFFF
    } else {
        0xFFFFFFFF << (32 - prefix_len)
    };

    (network_bits & mask) == (addr_bits & mask)
}

fn ip_v6_in_prefix(network: Ipv6Addr, addr: Ipv6Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    if prefix_len > 128 {
        return false;
    }

    let network_bits = u128::from(network);
    let addr_bits = u128::from(addr);

    let mask = if prefix_len == 128 {
        0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF
    } else {
        0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF << (128 - prefix_len)
    };

    (network_bits & mask) == (addr_bits & mask)
}
