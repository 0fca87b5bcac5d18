//! IPv4 address parsing and membership tests.
//!
//! Addresses are handled as plain `u32`s so that range comparisons are
//! unsigned and subnet tests are simple bit masking. Parsing is deliberately
//! stricter than [`std::net::Ipv4Addr`]'s: only canonical dotted-quad text is
//! accepted, so that nothing an administrator types can be read two ways.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bits in an IPv4 address, and so the longest valid prefix.
pub const MAX_PREFIX_LEN: u8 = 32;

/// Text that could not be understood as an IPv4 address, subnet or netmask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IPv4 address {text:?}: {reason}")]
pub struct InvalidAddress {
    pub text: String,
    pub reason: &'static str,
}

impl InvalidAddress {
    fn new(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }
}

/// Parse canonical dotted-quad text into its numeric form.
///
/// Exactly four octets, each `0`-`255`, written with one to three ASCII digits
/// and no leading zeros. Signs, whitespace, IPv6 and hostnames are rejected.
pub fn parse_ipv4(text: &str) -> Result<u32, InvalidAddress> {
    let mut value: u32 = 0;
    let mut octets = 0;
    for part in text.split('.') {
        octets += 1;
        if octets > 4 {
            return Err(InvalidAddress::new(text, "expected exactly four octets"));
        }
        if part.is_empty() {
            return Err(InvalidAddress::new(text, "empty octet"));
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAddress::new(text, "octets must be decimal digits"));
        }
        if part.len() > 1 && part.starts_with('0') {
            // Leading zeros are octal to some parsers.
            return Err(InvalidAddress::new(text, "octets must not have leading zeros"));
        }
        let octet = part
            .parse::<u16>()
            .ok()
            .filter(|octet| *octet <= 255)
            .ok_or_else(|| InvalidAddress::new(text, "octet out of range"))?;
        value = (value << 8) | u32::from(octet);
    }
    if octets != 4 {
        return Err(InvalidAddress::new(text, "expected exactly four octets"));
    }
    Ok(value)
}

/// Format a numeric address as canonical dotted-quad text.
pub fn format_ipv4(address: u32) -> String {
    let [a, b, c, d] = address.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// The netmask with the top `prefix_len` bits set.
///
/// Panics if `prefix_len` exceeds [`MAX_PREFIX_LEN`]; callers validate first.
pub fn netmask(prefix_len: u8) -> u32 {
    assert!(prefix_len <= MAX_PREFIX_LEN, "prefix length {prefix_len} out of range");
    // Shifting a u32 by 32 overflows, so `/0` needs its own arm.
    match prefix_len {
        0 => 0,
        n => u32::MAX << (MAX_PREFIX_LEN - n),
    }
}

/// Parse a prefix length, with or without a leading `/`.
pub fn parse_prefix_len(text: &str) -> Result<u8, InvalidAddress> {
    let digits = text.strip_prefix('/').unwrap_or(text);
    if digits.is_empty()
        || digits.len() > 2
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return Err(InvalidAddress::new(text, "malformed prefix length"));
    }
    digits
        .parse::<u8>()
        .ok()
        .filter(|len| *len <= MAX_PREFIX_LEN)
        .ok_or_else(|| InvalidAddress::new(text, "prefix length must be between 0 and 32"))
}

/// Convert a dotted netmask such as `255.255.255.0` into a prefix length.
/// Only contiguous masks are accepted.
pub fn prefix_from_netmask(text: &str) -> Result<u8, InvalidAddress> {
    let mask = parse_ipv4(text)?;
    let prefix_len = mask.leading_ones();
    if mask.checked_shl(prefix_len).unwrap_or(0) != 0 {
        return Err(InvalidAddress::new(text, "netmask is not contiguous"));
    }
    // At most 32, so the cast is lossless.
    Ok(prefix_len as u8)
}

/// Parse CIDR notation, `address/prefix_len`.
pub fn parse_cidr(text: &str) -> Result<(u32, u8), InvalidAddress> {
    let (address, prefix_len) = text
        .split_once('/')
        .ok_or_else(|| InvalidAddress::new(text, "expected address/prefix"))?;
    Ok((parse_ipv4(address)?, parse_prefix_len(prefix_len)?))
}

/// Does `ip` equal the rule's address?
pub fn matches_single(address: u32, ip: u32) -> bool {
    address == ip
}

/// Does `ip` lie within `[start, end]`, both bounds inclusive?
pub fn matches_range(start: u32, end: u32, ip: u32) -> bool {
    start <= ip && ip <= end
}

/// Does `ip` share the top `prefix_len` bits with `base`?
pub fn matches_subnet(base: u32, prefix_len: u8, ip: u32) -> bool {
    let mask = netmask(prefix_len);
    ip & mask == base & mask
}

/// A validated IPv4 address.
///
/// Serialised as dotted-quad text, and deserialisation re-validates, so an
/// `Address` read back from storage or an API request is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(u32);

impl Address {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ipv4(s).map(Self)
    }
}

impl TryFrom<String> for Address {
    type Error = InvalidAddress;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_ipv4(self.0))
    }
}
