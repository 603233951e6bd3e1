// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for address space command handling and replay
//!
//! These tests verify the complete flow:
//! 1. Handle command → generate events
//! 2. Apply events → produce new state
//! 3. Reconstruct state from the event stream

mod fixtures;

use pretty_assertions::assert_eq;

use cim_ipam::aggregate::{AddressSpaceState, CommandError};
use cim_ipam::config::IpamConfig;
use cim_ipam::domain::ValidationError;
use cim_ipam::events::IpamEvent;
use cim_ipam::hierarchy::{EqualPrefixPolicy, HierarchyError};

use fixtures::*;

/// Test: Full node lifecycle, checked against a replay of the stream
#[test]
fn test_address_space_lifecycle_replays_identically() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    let (root, site, lan, voice) = (node_id(1), node_id(2), node_id(3), node_id(4));

    space.register(root, "10.0.0.0/8", &[("Region", "EU")]).unwrap();
    space.register(lan, "10.1.2.0/24", &[("Owner", "desk")]).unwrap();
    space.register(voice, "10.1.3.0/24", &[]).unwrap();

    // Inserting 10.1.0.0/16 captures both /24s
    let events = space.register(site, "10.1.0.0/16", &[("Env", "Prod")]).unwrap();
    assert_eq!(
        events.iter().map(IpamEvent::event_type).collect::<Vec<_>>(),
        vec!["node_registered", "nodes_reparented"]
    );
    assert_eq!(space.parent_of(site), Some(root));
    assert_eq!(space.parent_of(lan), Some(site));
    assert_eq!(space.parent_of(voice), Some(site));
    assert_eq!(space.tags_of(site), tags(&[("Env", "Prod"), ("Tier", "Critical")]));

    // Inherited through the new parent
    assert_eq!(
        space.state.effective_tags(&lan).unwrap(),
        tags(&[("Env", "Prod"), ("Region", "EU"), ("Tier", "Critical")])
    );

    space.update_prefix(voice, "10.1.4.0/24").unwrap();
    space.delete(site).unwrap();
    assert_eq!(space.parent_of(lan), Some(root));
    assert_eq!(
        space.tags_of(lan),
        tags(&[("Env", "Prod"), ("Owner", "desk"), ("Tier", "Critical")])
    );

    let replayed = AddressSpaceState::from_events(address_space_id(), &space.events);
    assert_eq!(replayed, space.state);
    assert_eq!(replayed.version, space.events.len() as u64);
}

/// Test: Causation chains within one command batch
#[test]
fn test_batch_events_are_causally_chained() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/8", &[]).unwrap();
    space.register(node_id(2), "10.1.0.0/16", &[("Region", "EU")]).unwrap();
    space.register(node_id(3), "10.1.1.0/24", &[]).unwrap();

    let events = space.delete(node_id(2)).unwrap();
    assert_eq!(
        events.iter().map(IpamEvent::event_type).collect::<Vec<_>>(),
        vec!["node_tags_updated", "nodes_reparented", "node_deleted"]
    );

    assert_eq!(events[0].metadata().causation_id, None);
    for pair in events.windows(2) {
        assert_eq!(pair[1].metadata().causation_id, Some(pair[0].event_id()));
        assert_eq!(pair[1].correlation_id(), correlation_id());
    }
}

/// Test: A rejected command leaves no trace
#[test]
fn test_rejected_command_changes_nothing() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/8", &[("Env", "Prod")]).unwrap();
    let before = space.state.clone();

    let result = space.register(node_id(2), "10.1.0.0/16", &[("Env", "Dev")]);
    assert_eq!(
        result,
        Err(CommandError::Validation(ValidationError::InheritanceConflict {
            tag: "Env".to_string(),
            parent_value: "Prod".to_string(),
            child_value: "Dev".to_string(),
        }))
    );
    assert_eq!(space.state, before);
}

/// Test: Re-registering an id is rejected
#[test]
fn test_node_id_reuse_rejected() {
    let mut space = AddressSpaceHarness::new(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/8", &[]).unwrap();

    assert_eq!(
        space.register(node_id(1), "192.168.0.0/16", &[]),
        Err(CommandError::NodeAlreadyExists(node_id(1)))
    );
}

/// Test: IPv4 and IPv6 trees never interleave
#[test]
fn test_families_form_separate_trees() {
    let mut space = AddressSpaceHarness::new(IpamConfig::default());
    space.register(node_id(1), "0.0.0.0/0", &[]).unwrap();
    space.register(node_id(2), "2001:db8::/32", &[]).unwrap();
    space.register(node_id(3), "::/0", &[]).unwrap();
    space.register(node_id(4), "10.0.0.0/8", &[]).unwrap();

    assert_eq!(space.parent_of(node_id(2)), Some(node_id(3)));
    assert_eq!(space.parent_of(node_id(4)), Some(node_id(1)));
    assert_eq!(space.state.roots().count(), 2);
}

/// Test: Equal prefixes under the differentiation policy
#[test]
fn test_equal_prefix_policy() {
    let config = IpamConfig::default().with_equal_prefix_policy(EqualPrefixPolicy::AllowWithDifferentiation);
    let mut space = AddressSpaceHarness::with_standard_schema(config);

    space.register(node_id(1), "10.0.0.0/8", &[("Region", "EU")]).unwrap();
    space.register(node_id(2), "10.1.0.0/16", &[]).unwrap();

    let result = space.register(node_id(3), "10.0.0.0/8", &[("Region", "EU")]);
    assert!(matches!(
        result,
        Err(CommandError::Validation(ValidationError::InsufficientDifferentiation { .. }))
    ));

    space
        .register(node_id(3), "10.0.0.0/8", &[("Env", "Dev"), ("Region", "EU")])
        .unwrap();
    assert_eq!(space.parent_of(node_id(3)), Some(node_id(1)));
    // The more specific equal node takes over the children
    assert_eq!(space.parent_of(node_id(2)), Some(node_id(3)));
    assert_eq!(
        space.state.effective_tags(&node_id(2)).unwrap(),
        tags(&[("Env", "Dev"), ("Region", "EU")])
    );
}

/// Test: The default policy treats equal prefixes as duplicates
#[test]
fn test_duplicate_prefix_rejected_by_default() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/8", &[("Region", "EU")]).unwrap();

    assert_eq!(
        space.register(node_id(2), "10.0.0.0/8", &[("Env", "Dev")]),
        Err(CommandError::Hierarchy(HierarchyError::DuplicatePrefix {
            prefix: prefix("10.0.0.0/8"),
            existing: node_id(1),
        }))
    );
}

/// Test: Tag changes are re-checked against every descendant
#[test]
fn test_tag_update_conflicting_with_grandchild_rejected() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/8", &[]).unwrap();
    space.register(node_id(2), "10.1.0.0/16", &[]).unwrap();
    space.register(node_id(3), "10.1.1.0/24", &[("Tier", "Standard")]).unwrap();

    // Env=Prod implies Tier=Critical, inherited down to the /24
    let result = space.update_tags(node_id(1), &[("Env", "Prod")]);
    assert!(matches!(
        result,
        Err(CommandError::Validation(ValidationError::InheritanceConflict { .. }))
    ));

    space.update_tags(node_id(1), &[("Env", "Dev")]).unwrap();
    assert_eq!(
        space.state.effective_tags(&node_id(3)).unwrap(),
        tags(&[("Env", "Dev"), ("Tier", "Standard")])
    );
}

/// Test: Moving a node re-validates it under its new parent
#[test]
fn test_prefix_change_into_conflicting_subtree_rejected() {
    let mut space = AddressSpaceHarness::with_standard_schema(IpamConfig::default());
    space.register(node_id(1), "10.0.0.0/16", &[("Env", "Prod")]).unwrap();
    space.register(node_id(2), "10.1.0.0/16", &[("Env", "Dev")]).unwrap();
    space.register(node_id(3), "10.1.5.0/24", &[]).unwrap();

    let result = space.update_prefix(node_id(3), "10.0.5.0/24");
    assert!(result.is_ok());
    assert_eq!(space.parent_of(node_id(3)), Some(node_id(1)));

    space.update_tags(node_id(3), &[("Region", "EU")]).unwrap();
    space.update_tags(node_id(2), &[("Env", "Dev"), ("Region", "US")]).unwrap();

    let result = space.update_prefix(node_id(3), "10.1.5.0/24");
    assert!(matches!(
        result,
        Err(CommandError::Validation(ValidationError::InheritanceConflict { .. }))
    ));
    assert_eq!(space.state.node(&node_id(3)).unwrap().prefix, prefix("10.0.5.0/24"));
}
