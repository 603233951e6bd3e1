// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Node Entity
//!
//! A [`NetworkNode`] is one registered prefix inside an address space,
//! carrying its direct tags and its place in the containment hierarchy.
//! The hierarchy links (`parent_id`, `children_ids`) are derived data: they
//! are recomputed by [`crate::hierarchy::PrefixIndex`] on every insert,
//! move and removal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::domain::prefix::Prefix;
use crate::domain::tag::TagMap;

/// Unique identifier for an address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressSpaceId(Uuid);

impl AddressSpaceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AddressSpaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AddressSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a network node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered prefix in an address space
///
/// Invariants (maintained by the aggregate, not by this type):
/// - If `parent_id` is set, the parent's prefix strictly contains `prefix`,
///   or equals it under the equal-prefix allocation policy
/// - `children_ids` are exactly the nodes whose closest enclosing node is this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub address_space_id: AddressSpaceId,
    pub id: NodeId,
    pub prefix: Prefix,
    /// Direct tags (name -> value); inherited tags are not stored here
    pub tags: TagMap,
    pub parent_id: Option<NodeId>,
    pub children_ids: BTreeSet<NodeId>,
}

impl NetworkNode {
    /// Create a detached node with no tags
    pub fn new(address_space_id: AddressSpaceId, id: NodeId, prefix: Prefix) -> Self {
        Self {
            address_space_id,
            id,
            prefix,
            tags: TagMap::new(),
            parent_id: None,
            children_ids: BTreeSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: TagMap) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Top-level node (no enclosing prefix)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }
}
