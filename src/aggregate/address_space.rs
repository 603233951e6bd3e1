// Copyright (c) 2025 - Cowboy AI, Inc.
//! AddressSpace Aggregate
//!
//! One address space is one aggregate: its nodes and its tag schema change
//! together, so every write validates against a single snapshot.
//!
//! ```text
//! Command → handle_command() → Result<Vec<Event>, Error>
//!                                    ↓
//! Events → apply_event() → New State
//! ```

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    AddressSpaceId, NetworkNode, NodeId, Prefix, TagAssignment, TagInheritanceValidator, TagMap,
    TagSchema,
};
use crate::events::IpamEvent;
use crate::hierarchy::{EqualPrefixPolicy, PrefixIndex};

/// AddressSpace state reconstructed from events
///
/// # Reconstruction
///
/// ```rust,ignore
/// let state = AddressSpaceState::from_events(space_id, &events);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpaceState {
    /// Aggregate ID
    pub id: AddressSpaceId,

    pub nodes: BTreeMap<NodeId, NetworkNode>,

    pub schema: TagSchema,

    /// Number of events applied
    pub version: u64,

    /// First event timestamp
    pub created_at: Option<DateTime<Utc>>,

    /// Latest event timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl AddressSpaceState {
    /// Empty address space, the initial state for event folding
    pub fn new(id: AddressSpaceId) -> Self {
        Self {
            id,
            nodes: BTreeMap::new(),
            schema: TagSchema::new(),
            version: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Reconstruct state from an event stream
    pub fn from_events(id: AddressSpaceId, events: &[IpamEvent]) -> Self {
        events.iter().fold(Self::new(id), apply_event)
    }

    /// Has at least one event been applied
    pub fn is_initialized(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn node(&self, id: &NodeId) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First registered node with the same network as `prefix`
    pub fn node_by_prefix(&self, prefix: &Prefix) -> Option<&NetworkNode> {
        self.nodes().find(|node| node.prefix.same_network(prefix))
    }

    /// Nodes with no enclosing node
    pub fn roots(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes().filter(|node| node.is_root())
    }

    /// Enclosing nodes of `id`, closest first
    pub fn ancestors(&self, id: &NodeId) -> Vec<&NetworkNode> {
        let mut ancestors = Vec::new();
        let mut current = self.node(id).and_then(|node| node.parent_id);
        while let Some(parent_id) = current {
            let Some(parent) = self.node(&parent_id) else {
                break;
            };
            if ancestors.len() >= self.nodes.len() {
                break;
            }
            ancestors.push(parent);
            current = parent.parent_id;
        }
        ancestors
    }

    /// Every node below `id`, depth first
    pub fn descendants(&self, id: &NodeId) -> Vec<&NetworkNode> {
        let mut descendants = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeId> = self
            .node(id)
            .map(|node| node.children_ids.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(node) = self.node(&next) {
                descendants.push(node);
                stack.extend(node.children_ids.iter().rev().copied());
            }
        }
        descendants
    }

    /// Inheritable tags `id` passes down to its children
    pub fn effective_tags(&self, id: &NodeId) -> Option<TagMap> {
        self.effective_tags_under(id, &self.schema)
    }

    /// [`Self::effective_tags`] evaluated against a candidate `schema`
    pub fn effective_tags_under(&self, id: &NodeId, schema: &TagSchema) -> Option<TagMap> {
        let node = self.node(id)?;
        let chain = self.ancestors(id);
        let validator = TagInheritanceValidator::new(schema);

        Some(validator.effective_tags_for_chain(
            chain
                .iter()
                .rev()
                .map(|ancestor| &ancestor.tags)
                .chain(std::iter::once(&node.tags)),
        ))
    }

    /// Inherited tags of `id`, the effective tags of its parent
    pub fn inherited_tags(&self, id: &NodeId) -> TagMap {
        self.node(id)
            .and_then(|node| node.parent_id)
            .and_then(|parent_id| self.effective_tags(&parent_id))
            .unwrap_or_default()
    }

    /// All tags visible on `id`: inherited ones plus every direct tag
    pub fn resolved_tags(&self, id: &NodeId) -> Vec<TagAssignment> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };

        let mut resolved: Vec<TagAssignment> = self
            .inherited_tags(id)
            .into_iter()
            .filter(|(name, _)| !node.tags.contains_key(name))
            .map(|(name, value)| TagAssignment::inherited(name, value))
            .collect();
        resolved.extend(
            node.tags
                .iter()
                .map(|(name, value)| TagAssignment::direct(name.clone(), value.clone())),
        );
        resolved.sort_by(|a, b| a.name.cmp(&b.name));
        resolved
    }

    /// Nodes carrying `name = value` directly or by inheritance
    pub fn find_by_tag(&self, name: &str, value: &str) -> Vec<&NetworkNode> {
        self.nodes()
            .filter(|node| {
                self.resolved_tags(&node.id)
                    .iter()
                    .any(|tag| tag.name == name && tag.value == value)
            })
            .collect()
    }

    /// Placement index over the current nodes
    pub fn prefix_index(&self, policy: EqualPrefixPolicy) -> PrefixIndex<'_> {
        PrefixIndex::new(self.nodes.values()).with_policy(policy)
    }

    fn attach(&mut self, node_id: NodeId, parent_id: Option<NodeId>) {
        let previous = self.nodes.get(&node_id).and_then(|node| node.parent_id);
        if let Some(old) = previous.and_then(|id| self.nodes.get_mut(&id)) {
            old.children_ids.remove(&node_id);
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.parent_id = parent_id;
        }
        if let Some(new) = parent_id.and_then(|id| self.nodes.get_mut(&id)) {
            new.children_ids.insert(node_id);
        }
    }
}

/// Apply event to state (pure function)
///
/// Never fails: events are facts already validated by the handlers.
/// Hierarchy links are kept two-way, `parent_id` on the child and
/// `children_ids` on the parent.
pub fn apply_event(mut state: AddressSpaceState, event: &IpamEvent) -> AddressSpaceState {
    match event {
        IpamEvent::NodeRegistered(e) => {
            let node = NetworkNode::new(state.id, e.node_id, e.prefix).with_tags(e.tags.clone());
            state.nodes.insert(e.node_id, node);
            state.attach(e.node_id, e.parent_id);
        }

        IpamEvent::NodeTagsUpdated(e) => {
            if let Some(node) = state.nodes.get_mut(&e.node_id) {
                node.tags = e.tags.clone();
            }
        }

        IpamEvent::NodePrefixChanged(e) => {
            if let Some(node) = state.nodes.get_mut(&e.node_id) {
                node.prefix = e.new_prefix;
            }
            state.attach(e.node_id, e.parent_id);
        }

        IpamEvent::NodesReparented(e) => {
            for reparent in &e.moves {
                state.attach(reparent.node_id, reparent.to);
            }
        }

        IpamEvent::NodeDeleted(e) => {
            let parent_id = state.nodes.get(&e.node_id).and_then(|node| node.parent_id);
            let orphans: Vec<NodeId> = state
                .nodes
                .get(&e.node_id)
                .map(|node| node.children_ids.iter().copied().collect())
                .unwrap_or_default();

            // Normally empty: handlers re-parent children before deleting
            for orphan in orphans {
                state.attach(orphan, parent_id);
            }
            state.attach(e.node_id, None);
            state.nodes.remove(&e.node_id);
        }

        IpamEvent::TagDefinitionSaved(e) => {
            state.schema.insert(e.definition.clone());
        }

        IpamEvent::TagDefinitionDeleted(e) => {
            state.schema.remove(&e.name);
        }
    }

    let timestamp = event.timestamp();
    state.created_at.get_or_insert(timestamp);
    state.updated_at = Some(timestamp);
    state.version += 1;
    state
}
