// Copyright (c) 2025 - Cowboy AI, Inc.
//! CIDR Prefix Value Object
//!
//! A [`Prefix`] is an IPv4 or IPv6 network written as `<address>/<length>`.
//! Both families share one representation: the address is held as a 128-bit
//! integer (IPv4 in the low 32 bits) so containment and subnetting are the
//! same bit arithmetic for either family, only the width differs.
//!
//! The literal address is preserved. `10.1.2.3/8` keeps its host bits and
//! prints back as `10.1.2.3/8`; every comparison that reasons about networks
//! masks first.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// CIDR parsing and subnetting error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("Invalid CIDR format: {0} (expected <address>/<length>)")]
    InvalidFormat(String),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Invalid prefix length: {length} (must be 0-{max} for {family})")]
    InvalidLength {
        length: String,
        family: IpFamily,
        max: u8,
    },
}

/// Address family of a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Family of a parsed address
    pub fn of(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => IpFamily::V4,
            IpAddr::V6(_) => IpFamily::V6,
        }
    }

    /// Address width in bits (32 or 128)
    pub const fn max_len(self) -> u8 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }

    const fn full_mask(self) -> u128 {
        match self {
            IpFamily::V4 => u32::MAX as u128,
            IpFamily::V6 => u128::MAX,
        }
    }

    /// Mask selecting the top `length` bits of an address of this family
    fn mask(self, length: u8) -> u128 {
        if length == 0 {
            return 0;
        }
        let width = u32::from(self.max_len());
        (u128::MAX << (width - u32::from(length))) & self.full_mask()
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// CIDR network prefix value object
///
/// Invariants:
/// - Length is within the family range (0-32 for IPv4, 0-128 for IPv6)
/// - The address given at parse time is kept as-is (host bits not zeroed)
/// - Ordered by (family, numeric address, length), IPv4 before IPv6
///
/// # Examples
///
/// ```rust
/// use cim_ipam::domain::Prefix;
///
/// let site = Prefix::parse("10.0.0.0/8").unwrap();
/// let rack = Prefix::parse("10.1.0.0/16").unwrap();
/// assert!(rack.is_subnet_of(&site));
/// assert!(!rack.is_subnet_of(&rack));
/// assert_eq!(rack.to_string(), "10.1.0.0/16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix {
    family: IpFamily,
    address: u128,
    length: u8,
}

impl Prefix {
    /// Parse `<address>/<length>`
    ///
    /// The family is detected from the address syntax. No whitespace is
    /// accepted anywhere in the input.
    pub fn parse(text: &str) -> Result<Self, PrefixError> {
        let parts: Vec<&str> = text.split('/').collect();
        let [addr_str, len_str] = parts.as_slice() else {
            return Err(PrefixError::InvalidFormat(text.to_string()));
        };

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| PrefixError::InvalidAddress(addr_str.to_string()))?;
        let family = IpFamily::of(&address);

        // u8::from_str accepts a leading '+' and leading zeros, CIDR does not
        let length = Some(*len_str)
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .filter(|s| *s == "0" || !s.starts_with('0'))
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or_else(|| invalid_length(len_str, family))?;

        Self::new(address, length)
    }

    /// Create from an address and a prefix length
    pub fn new(address: IpAddr, length: u8) -> Result<Self, PrefixError> {
        let family = IpFamily::of(&address);
        if length > family.max_len() {
            return Err(invalid_length(length, family));
        }

        Ok(Self {
            family,
            address: address_bits(address),
            length,
        })
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    pub fn is_ipv4(&self) -> bool {
        self.family == IpFamily::V4
    }

    pub fn is_ipv6(&self) -> bool {
        self.family == IpFamily::V6
    }

    /// Prefix length in bits
    pub fn len(&self) -> u8 {
        self.length
    }

    /// Maximum prefix length for this family
    pub fn max_len(&self) -> u8 {
        self.family.max_len()
    }

    /// The address exactly as it was given
    pub fn addr(&self) -> IpAddr {
        self.to_ip(self.address)
    }

    /// First address of the network (host bits cleared)
    pub fn network(&self) -> IpAddr {
        self.to_ip(self.network_bits())
    }

    /// Last address of the network (host bits set)
    pub fn last(&self) -> IpAddr {
        self.to_ip(self.last_bits())
    }

    /// True iff every address of `other` lies inside this prefix
    ///
    /// Requires the same family and `self.len() <= other.len()`; the
    /// addresses are compared under this prefix's mask. An IPv4 prefix is
    /// never promoted to IPv6, so cross-family containment is always false.
    pub fn contains(&self, other: &Prefix) -> bool {
        if self.family != other.family || self.length > other.length {
            return false;
        }
        let mask = self.family.mask(self.length);
        self.address & mask == other.address & mask
    }

    /// Strict containment: `other` is a longer prefix inside this one
    pub fn is_supernet_of(&self, other: &Prefix) -> bool {
        self.length < other.length && self.contains(other)
    }

    /// Strict containment in the other direction
    pub fn is_subnet_of(&self, other: &Prefix) -> bool {
        other.is_supernet_of(self)
    }

    /// Both prefixes describe the same network (mutual containment)
    pub fn same_network(&self, other: &Prefix) -> bool {
        self.length == other.length && self.contains(other)
    }

    /// Either prefix contains the other
    pub fn overlaps(&self, other: &Prefix) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Partition this prefix into subnets of `new_length`
    ///
    /// Yields `2^(new_length - len)` prefixes in ascending network order,
    /// starting at the network address.
    ///
    /// # Errors
    /// - `InvalidLength` if `new_length <= len` or exceeds the family maximum
    pub fn subnets(&self, new_length: u8) -> Result<Subnets, PrefixError> {
        if new_length <= self.length || new_length > self.family.max_len() {
            return Err(invalid_length(new_length, self.family));
        }

        let width = u32::from(self.family.max_len());
        let split_bits = u32::from(new_length - self.length);
        let last_index = if split_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << split_bits) - 1
        };

        Ok(Subnets {
            family: self.family,
            length: new_length,
            next: self.network_bits(),
            step: 1u128 << (width - u32::from(new_length)),
            remaining: Some(last_index),
        })
    }

    fn network_bits(&self) -> u128 {
        self.address & self.family.mask(self.length)
    }

    fn last_bits(&self) -> u128 {
        self.network_bits() | (!self.family.mask(self.length) & self.family.full_mask())
    }

    fn to_ip(&self, bits: u128) -> IpAddr {
        match self.family {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
        }
    }
}

fn address_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn invalid_length(length: impl ToString, family: IpFamily) -> PrefixError {
    PrefixError::InvalidLength {
        length: length.to_string(),
        family,
        max: family.max_len(),
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.length)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Prefix {
    type Error = PrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.to_string()
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        Self {
            family: IpFamily::of(&net.addr()),
            address: address_bits(net.addr()),
            length: net.prefix_len(),
        }
    }
}

impl TryFrom<Prefix> for IpNet {
    type Error = PrefixError;

    fn try_from(prefix: Prefix) -> Result<Self, Self::Error> {
        let length_error = |_| invalid_length(prefix.length, prefix.family);
        match prefix.addr() {
            IpAddr::V4(v4) => Ipv4Net::new(v4, prefix.length)
                .map(IpNet::V4)
                .map_err(length_error),
            IpAddr::V6(v6) => Ipv6Net::new(v6, prefix.length)
                .map(IpNet::V6)
                .map_err(length_error),
        }
    }
}

/// Lazy iterator over the subnets of a prefix
///
/// Lazy because `/0` split into `/128` has 2^128 members.
#[derive(Debug, Clone)]
pub struct Subnets {
    family: IpFamily,
    length: u8,
    next: u128,
    step: u128,
    /// Subnets left after `next`; `None` once exhausted
    remaining: Option<u128>,
}

impl Iterator for Subnets {
    type Item = Prefix;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining?;
        let prefix = Prefix {
            family: self.family,
            address: self.next,
            length: self.length,
        };

        if remaining == 0 {
            self.remaining = None;
        } else {
            self.remaining = Some(remaining - 1);
            self.next += self.step;
        }

        Some(prefix)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            None => (0, Some(0)),
            Some(rest) => match usize::try_from(rest).ok().and_then(|r| r.checked_add(1)) {
                Some(count) => (count, Some(count)),
                None => (usize::MAX, None),
            },
        }
    }
}
