// Copyright (c) 2025 - Cowboy AI, Inc.
//! Commands for the AddressSpace Aggregate
//!
//! Commands express intent and can be rejected by the handlers. Each one
//! carries an explicit `timestamp`; handlers never read the clock.
//!
//! ```text
//! Command → handle_command(&State, Command, &IpamConfig) → Result<Vec<Event>, Error>
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NodeId, Prefix, PrefixError, TagDefinition, TagMap};

/// Command to register a prefix as a new node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterNodeCommand {
    /// Identity of the node to create
    pub node_id: NodeId,

    pub prefix: Prefix,

    /// Direct tags before implication expansion
    pub tags: TagMap,

    /// Timestamp when command was issued (explicit time parameter)
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for distributed tracing
    pub correlation_id: Uuid,

    pub causation_id: Option<Uuid>,
}

impl RegisterNodeCommand {
    /// Register `prefix` under a freshly generated node id
    pub fn new(prefix: Prefix, tags: TagMap, timestamp: DateTime<Utc>, correlation_id: Uuid) -> Self {
        Self {
            node_id: NodeId::new(),
            prefix,
            tags,
            timestamp,
            correlation_id,
            causation_id: None,
        }
    }

    /// Same as [`Self::new`] from CIDR text
    pub fn from_cidr(
        cidr: &str,
        tags: TagMap,
        timestamp: DateTime<Utc>,
        correlation_id: Uuid,
    ) -> Result<Self, PrefixError> {
        Ok(Self::new(cidr.parse()?, tags, timestamp, correlation_id))
    }
}

/// Command to replace a node's direct tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNodeTagsCommand {
    pub node_id: NodeId,
    pub tags: TagMap,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

/// Command to move a node to a different prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNodePrefixCommand {
    pub node_id: NodeId,
    pub prefix: Prefix,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

/// Command to remove a node, re-parenting its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteNodeCommand {
    pub node_id: NodeId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

/// Command to create or replace a tag definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTagDefinitionCommand {
    pub definition: TagDefinition,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

/// Command to remove a tag definition by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTagDefinitionCommand {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}
