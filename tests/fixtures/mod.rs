// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-ipam
//!
//! Deterministic test data shared by the integration suites. Ids and
//! timestamps are fixed constants so event streams are reproducible.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cim_ipam::aggregate::*;
use cim_ipam::config::IpamConfig;
use cim_ipam::domain::{AddressSpaceId, NodeId, Prefix, TagDefinition, TagMap, TagType};
use cim_ipam::events::IpamEvent;

pub const ADDRESS_SPACE_ID_1: &str = "01934f4a-1000-7000-8000-000000001000";

pub const CORRELATION_ID_1: &str = "01934f4a-c001-7000-8000-00000000c001";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn address_space_id() -> AddressSpaceId {
    AddressSpaceId::from_uuid(parse_uuid(ADDRESS_SPACE_ID_1))
}

pub fn correlation_id() -> Uuid {
    parse_uuid(CORRELATION_ID_1)
}

/// Deterministic node id `n`
pub fn node_id(n: u16) -> NodeId {
    NodeId::from_uuid(parse_uuid(&format!("01934f4a-{n:04x}-7000-8000-00000000beef")))
}

pub fn prefix(cidr: &str) -> Prefix {
    cidr.parse().expect("Invalid prefix in test fixture")
}

pub fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// `Env` (Prod|Dev|Staging), Prod implies `Tier=Critical`
pub fn env_definition(space: AddressSpaceId) -> TagDefinition {
    TagDefinition::new(space, "Env", TagType::Inheritable)
        .expect("Invalid definition")
        .with_known_values(["Prod", "Dev", "Staging"])
        .with_implication("Prod", "Tier", "Critical")
}

/// `Tier` (Critical|Standard)
pub fn tier_definition(space: AddressSpaceId) -> TagDefinition {
    TagDefinition::new(space, "Tier", TagType::Inheritable)
        .expect("Invalid definition")
        .with_known_values(["Critical", "Standard"])
}

/// Free-form inheritable `Region`
pub fn region_definition(space: AddressSpaceId) -> TagDefinition {
    TagDefinition::new(space, "Region", TagType::Inheritable).expect("Invalid definition")
}

/// Free-form non-inheritable `Owner`
pub fn owner_definition(space: AddressSpaceId) -> TagDefinition {
    TagDefinition::new(space, "Owner", TagType::NonInheritable).expect("Invalid definition")
}

pub fn register_command(id: NodeId, cidr: &str, pairs: &[(&str, &str)]) -> RegisterNodeCommand {
    RegisterNodeCommand {
        node_id: id,
        prefix: prefix(cidr),
        tags: tags(pairs),
        timestamp: fixed_timestamp(),
        correlation_id: correlation_id(),
        causation_id: None,
    }
}

pub fn save_definition_command(definition: TagDefinition) -> SaveTagDefinitionCommand {
    SaveTagDefinitionCommand {
        definition,
        timestamp: fixed_timestamp(),
        correlation_id: correlation_id(),
        causation_id: None,
    }
}

/// Drives the pure handlers and keeps the resulting event stream
pub struct AddressSpaceHarness {
    pub state: AddressSpaceState,
    pub events: Vec<IpamEvent>,
    pub config: IpamConfig,
}

impl AddressSpaceHarness {
    pub fn new(config: IpamConfig) -> Self {
        Self {
            state: AddressSpaceState::new(address_space_id()),
            events: Vec::new(),
            config,
        }
    }

    /// Empty address space with Env, Tier, Region and Owner defined
    pub fn with_standard_schema(config: IpamConfig) -> Self {
        let mut harness = Self::new(config);
        let space = harness.state.id;
        for definition in [
            tier_definition(space),
            env_definition(space),
            region_definition(space),
            owner_definition(space),
        ] {
            harness
                .run(|state, config| handle_save_tag_definition(state, save_definition_command(definition), config))
                .expect("Standard schema must be valid");
        }
        harness
    }

    /// Apply the handler's events on success; leave state untouched on error
    pub fn run<F>(&mut self, handler: F) -> Result<Vec<IpamEvent>, CommandError>
    where
        F: FnOnce(&AddressSpaceState, &IpamConfig) -> Result<Vec<IpamEvent>, CommandError>,
    {
        let events = handler(&self.state, &self.config)?;
        for event in &events {
            self.state = apply_event(self.state.clone(), event);
        }
        self.events.extend(events.iter().cloned());
        Ok(events)
    }

    pub fn register(&mut self, id: NodeId, cidr: &str, pairs: &[(&str, &str)]) -> Result<Vec<IpamEvent>, CommandError> {
        let command = register_command(id, cidr, pairs);
        self.run(|state, config| handle_register_node(state, command, config))
    }

    pub fn update_tags(&mut self, id: NodeId, pairs: &[(&str, &str)]) -> Result<Vec<IpamEvent>, CommandError> {
        let command = UpdateNodeTagsCommand {
            node_id: id,
            tags: tags(pairs),
            timestamp: fixed_timestamp(),
            correlation_id: correlation_id(),
            causation_id: None,
        };
        self.run(|state, config| handle_update_node_tags(state, command, config))
    }

    pub fn update_prefix(&mut self, id: NodeId, cidr: &str) -> Result<Vec<IpamEvent>, CommandError> {
        let command = UpdateNodePrefixCommand {
            node_id: id,
            prefix: prefix(cidr),
            timestamp: fixed_timestamp(),
            correlation_id: correlation_id(),
            causation_id: None,
        };
        self.run(|state, config| handle_update_node_prefix(state, command, config))
    }

    pub fn delete(&mut self, id: NodeId) -> Result<Vec<IpamEvent>, CommandError> {
        let command = DeleteNodeCommand {
            node_id: id,
            timestamp: fixed_timestamp(),
            correlation_id: correlation_id(),
            causation_id: None,
        };
        self.run(|state, config| handle_delete_node(state, command, config))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.state.node(&id).and_then(|node| node.parent_id)
    }

    pub fn tags_of(&self, id: NodeId) -> TagMap {
        self.state
            .node(&id)
            .map(|node| node.tags.clone())
            .unwrap_or_default()
    }
}
