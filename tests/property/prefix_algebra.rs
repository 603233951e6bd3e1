// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Prefix Algebra
//!
//! Containment is a partial order within one family, subnets partition
//! their parent, and every answer agrees with `ipnet`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use cim_ipam::domain::Prefix;
use ipnet::IpNet;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn any_v4() -> impl Strategy<Value = Prefix> {
    (any::<u32>(), 0u8..=32).prop_map(|(bits, len)| {
        Prefix::new(IpAddr::V4(Ipv4Addr::from(bits)), len).unwrap()
    })
}

fn any_v6() -> impl Strategy<Value = Prefix> {
    (any::<u128>(), 0u8..=128).prop_map(|(bits, len)| {
        Prefix::new(IpAddr::V6(Ipv6Addr::from(bits)), len).unwrap()
    })
}

fn any_prefix() -> impl Strategy<Value = Prefix> {
    prop_oneof![any_v4(), any_v6()]
}

/// Prefixes inside 10.0.0.0/8 with few distinct networks, so containment
/// between independently drawn values is common
fn clustered_v4() -> impl Strategy<Value = Prefix> {
    (0u8..4, 0u8..4, 8u8..=24).prop_map(|(b, c, len)| {
        Prefix::new(IpAddr::V4(Ipv4Addr::new(10, b, c, 0)), len).unwrap()
    })
}

// ============================================================================
// Parsing
// ============================================================================

proptest! {
    /// Display then parse yields the same prefix, host bits included
    #[test]
    fn prop_display_parse_round_trip(prefix in any_prefix()) {
        let text = prefix.to_string();
        prop_assert_eq!(text.parse::<Prefix>().unwrap(), prefix);
    }

    /// Lengths beyond the family maximum never parse
    #[test]
    fn prop_overlong_v4_length_rejected(bits in any::<u32>(), len in 33u16..=999) {
        let text = format!("{}/{}", Ipv4Addr::from(bits), len);
        prop_assert!(text.parse::<Prefix>().is_err());
    }
}

// ============================================================================
// Containment
// ============================================================================

proptest! {
    #[test]
    fn prop_contains_is_reflexive(prefix in any_prefix()) {
        prop_assert!(prefix.contains(&prefix));
        prop_assert!(prefix.same_network(&prefix));
        prop_assert!(!prefix.is_supernet_of(&prefix));
    }

    #[test]
    fn prop_contains_is_antisymmetric(a in clustered_v4(), b in clustered_v4()) {
        if a.contains(&b) && b.contains(&a) {
            prop_assert!(a.same_network(&b));
            prop_assert_eq!(a.network(), b.network());
        }
    }

    #[test]
    fn prop_contains_is_transitive(a in clustered_v4(), b in clustered_v4(), c in clustered_v4()) {
        if a.contains(&b) && b.contains(&c) {
            prop_assert!(a.contains(&c));
        }
    }

    /// Strict containment never runs both ways
    #[test]
    fn prop_supernet_is_asymmetric(a in clustered_v4(), b in clustered_v4()) {
        prop_assert!(!(a.is_supernet_of(&b) && b.is_supernet_of(&a)));
        prop_assert_eq!(a.is_supernet_of(&b), b.is_subnet_of(&a));
    }

    #[test]
    fn prop_families_never_contain_each_other(v4 in any_v4(), v6 in any_v6()) {
        prop_assert!(!v4.contains(&v6));
        prop_assert!(!v6.contains(&v4));
        prop_assert!(!v4.overlaps(&v6));
    }

    /// Containment matches `ipnet` for every pair
    #[test]
    fn prop_contains_agrees_with_ipnet(a in clustered_v4(), b in clustered_v4()) {
        let net_a = IpNet::try_from(a).unwrap();
        let net_b = IpNet::try_from(b).unwrap();
        prop_assert_eq!(a.contains(&b), net_a.contains(&net_b));
        prop_assert_eq!(a.network(), net_a.network());
    }

    #[test]
    fn prop_ipnet_conversion_round_trip(prefix in any_prefix()) {
        let net = IpNet::try_from(prefix).unwrap();
        prop_assert_eq!(Prefix::from(net), prefix);
        prop_assert_eq!(net.prefix_len(), prefix.len());
    }
}

// ============================================================================
// Subnet partitioning
// ============================================================================

proptest! {
    /// Subnets are disjoint, ascending and cover the parent exactly
    #[test]
    fn prop_subnets_partition_parent(parent in any_v4(), extra in 1u8..=4) {
        prop_assume!(parent.len() + extra <= 32);
        let subnets: Vec<Prefix> = parent.subnets(parent.len() + extra).unwrap().collect();

        prop_assert_eq!(subnets.len(), 1usize << extra);
        prop_assert_eq!(subnets[0].network(), parent.network());
        prop_assert_eq!(subnets[subnets.len() - 1].last(), parent.last());

        for subnet in &subnets {
            prop_assert!(parent.is_supernet_of(subnet));
        }
        for pair in subnets.windows(2) {
            prop_assert!(!pair[0].overlaps(&pair[1]));
            prop_assert!(pair[0].network() < pair[1].network());
        }
    }

    /// Same law at 128-bit width, including splits of `::/0`
    #[test]
    fn prop_v6_subnets_partition_parent(parent in any_v6(), extra in 1u8..=6) {
        prop_assume!(parent.len() + extra <= 128);
        let subnets: Vec<Prefix> = parent.subnets(parent.len() + extra).unwrap().collect();

        prop_assert_eq!(subnets.len(), 1usize << extra);
        prop_assert_eq!(subnets[0].network(), parent.network());
        prop_assert_eq!(subnets[subnets.len() - 1].last(), parent.last());

        for subnet in &subnets {
            prop_assert!(parent.is_supernet_of(subnet));
        }
        for pair in subnets.windows(2) {
            prop_assert!(!pair[0].overlaps(&pair[1]));
            prop_assert!(pair[0].network() < pair[1].network());
            prop_assert_eq!(pair[1].len(), parent.len() + extra);
        }
    }

    #[test]
    fn prop_subnets_of_equal_or_shorter_length_rejected(parent in any_prefix(), shorter in 0u8..=128) {
        prop_assume!(shorter <= parent.len());
        prop_assert!(parent.subnets(shorter).is_err());
    }
}
