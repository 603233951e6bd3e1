// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address Space Domain Events
//!
//! Every change to an address space is one of these facts. Tags carried by
//! node events are the fully expanded direct tags, already validated; applying
//! an event never re-runs validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AddressSpaceId, NodeId, Prefix, TagDefinition, TagMap};
use crate::hierarchy::Reparent;

/// Current schema version of every event payload
pub const EVENT_VERSION: u32 = 1;

/// Fields shared by every address space event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    pub address_space_id: AddressSpaceId,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for request tracing
    pub correlation_id: Uuid,

    /// Causation ID (event or command that caused this event)
    pub causation_id: Option<Uuid>,
}

impl EventMetadata {
    pub fn new(
        address_space_id: AddressSpaceId,
        timestamp: DateTime<Utc>,
        correlation_id: Uuid,
        causation_id: Option<Uuid>,
    ) -> Self {
        Self {
            event_version: EVENT_VERSION,
            event_id: Uuid::now_v7(),
            address_space_id,
            timestamp,
            correlation_id,
            causation_id,
        }
    }
}

/// Address Space Domain Events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpamEvent {
    /// A prefix was registered as a new node
    NodeRegistered(NodeRegistered),

    /// A node's direct tags were replaced
    NodeTagsUpdated(NodeTagsUpdated),

    /// A node moved to a different prefix
    NodePrefixChanged(NodePrefixChanged),

    /// One or more nodes moved to a new parent
    NodesReparented(NodesReparented),

    /// A node was removed
    NodeDeleted(NodeDeleted),

    /// A tag definition was created or replaced
    TagDefinitionSaved(TagDefinitionSaved),

    /// A tag definition was removed
    TagDefinitionDeleted(TagDefinitionDeleted),
}

impl IpamEvent {
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            IpamEvent::NodeRegistered(e) => &e.metadata,
            IpamEvent::NodeTagsUpdated(e) => &e.metadata,
            IpamEvent::NodePrefixChanged(e) => &e.metadata,
            IpamEvent::NodesReparented(e) => &e.metadata,
            IpamEvent::NodeDeleted(e) => &e.metadata,
            IpamEvent::TagDefinitionSaved(e) => &e.metadata,
            IpamEvent::TagDefinitionDeleted(e) => &e.metadata,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.metadata().event_id
    }

    pub fn address_space_id(&self) -> AddressSpaceId {
        self.metadata().address_space_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.metadata().timestamp
    }

    pub fn correlation_id(&self) -> Uuid {
        self.metadata().correlation_id
    }

    /// Serialized `type` tag of this event
    pub fn event_type(&self) -> &'static str {
        match self {
            IpamEvent::NodeRegistered(_) => "node_registered",
            IpamEvent::NodeTagsUpdated(_) => "node_tags_updated",
            IpamEvent::NodePrefixChanged(_) => "node_prefix_changed",
            IpamEvent::NodesReparented(_) => "nodes_reparented",
            IpamEvent::NodeDeleted(_) => "node_deleted",
            IpamEvent::TagDefinitionSaved(_) => "tag_definition_saved",
            IpamEvent::TagDefinitionDeleted(_) => "tag_definition_deleted",
        }
    }
}

/// A prefix was registered in the address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistered {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub node_id: NodeId,
    pub prefix: Prefix,

    /// Direct tags after implication expansion
    pub tags: TagMap,

    /// Closest enclosing node at registration time
    pub parent_id: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTagsUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub node_id: NodeId,

    /// Replacement direct tags after implication expansion
    pub tags: TagMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePrefixChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub node_id: NodeId,
    pub old_prefix: Prefix,
    pub new_prefix: Prefix,

    /// Closest enclosing node for the new prefix
    pub parent_id: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesReparented {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub moves: Vec<Reparent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDeleted {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub node_id: NodeId,
    pub prefix: Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinitionSaved {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub definition: TagDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinitionDeleted {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub name: String,
}
