// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hierarchy Placement
//!
//! Computes where a prefix belongs in an address space's containment tree:
//! the closest enclosing node (longest-prefix-match parent) and the existing
//! nodes the new prefix would enclose. The index borrows a snapshot of the
//! address space and never mutates it; callers turn the result into events.
//!
//! ```text
//! 10.0.0.0/8
//! └── 10.1.0.0/16          closest_parent(10.1.2.0/24)
//!     ├── 10.1.2.0/24      <- candidate
//!     │   └── 10.1.2.128/25    displaced_children(10.1.2.0/24, 10.1.0.0/16)
//!     └── 10.1.3.0/24
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::network::{NetworkNode, NodeId};
use crate::domain::prefix::Prefix;

/// Hierarchy placement error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Prefix {prefix} is already registered as node {existing}")]
    DuplicatePrefix { prefix: Prefix, existing: NodeId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Unknown equal-prefix policy: {0}")]
    UnknownPolicy(String),
}

/// How a prefix equal to an existing one is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualPrefixPolicy {
    /// Same network as an existing node is a duplicate
    #[default]
    Reject,
    /// An equal existing node may act as parent if the child adds inheritable tags
    AllowWithDifferentiation,
}

impl EqualPrefixPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EqualPrefixPolicy::Reject => "reject",
            EqualPrefixPolicy::AllowWithDifferentiation => "allow-with-differentiation",
        }
    }
}

impl fmt::Display for EqualPrefixPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EqualPrefixPolicy {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(EqualPrefixPolicy::Reject),
            "allow-with-differentiation" | "allow" => Ok(EqualPrefixPolicy::AllowWithDifferentiation),
            other => Err(HierarchyError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Where a new prefix goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub parent_id: Option<NodeId>,
    /// Existing nodes that move under the new prefix
    pub children: Vec<NodeId>,
}

/// One node moving to a new parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reparent {
    pub node_id: NodeId,
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
}

/// Read-only placement index over one address space snapshot
#[derive(Debug, Clone)]
pub struct PrefixIndex<'a> {
    nodes: Vec<&'a NetworkNode>,
    by_id: HashMap<NodeId, &'a NetworkNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
    policy: EqualPrefixPolicy,
}

impl<'a> PrefixIndex<'a> {
    /// Index `nodes` under the default [`EqualPrefixPolicy::Reject`]
    pub fn new(nodes: impl IntoIterator<Item = &'a NetworkNode>) -> Self {
        let nodes: Vec<&'a NetworkNode> = nodes.into_iter().collect();
        let by_id = nodes.iter().map(|node| (node.id, *node)).collect();

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in &nodes {
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node.id);
            }
        }

        Self {
            nodes,
            by_id,
            children,
            policy: EqualPrefixPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EqualPrefixPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EqualPrefixPolicy {
        self.policy
    }

    pub fn get(&self, id: &NodeId) -> Option<&'a NetworkNode> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Most specific existing node containing `candidate`
    pub fn closest_parent(&self, candidate: &Prefix) -> Option<&'a NetworkNode> {
        self.closest_parent_excluding(candidate, &HashSet::new())
    }

    /// [`Self::closest_parent`] ignoring the nodes in `excluded`
    ///
    /// Longest length wins. Equal-length candidates only occur in an
    /// equal-prefix chain, where the deepest node wins.
    pub fn closest_parent_excluding(
        &self,
        candidate: &Prefix,
        excluded: &HashSet<NodeId>,
    ) -> Option<&'a NetworkNode> {
        self.nodes
            .iter()
            .copied()
            .filter(|node| !excluded.contains(&node.id))
            .filter(|node| self.encloses(&node.prefix, candidate))
            .max_by_key(|node| (node.prefix.len(), self.depth(node)))
    }

    /// Nodes currently under `new_parent` that `candidate` strictly contains
    pub fn displaced_children(
        &self,
        candidate: &Prefix,
        new_parent: Option<NodeId>,
    ) -> Vec<&'a NetworkNode> {
        self.nodes
            .iter()
            .copied()
            .filter(|node| node.parent_id == new_parent)
            .filter(|node| candidate.is_supernet_of(&node.prefix))
            .collect()
    }

    /// Existing node with the same network as `candidate`
    pub fn find_duplicate(&self, candidate: &Prefix) -> Option<&'a NetworkNode> {
        self.nodes
            .iter()
            .copied()
            .find(|node| node.prefix.same_network(candidate))
    }

    /// Parent and displaced children for a new `candidate`
    pub fn placement(&self, candidate: &Prefix) -> Result<Placement, HierarchyError> {
        if self.policy == EqualPrefixPolicy::Reject {
            if let Some(existing) = self.find_duplicate(candidate) {
                return Err(HierarchyError::DuplicatePrefix {
                    prefix: *candidate,
                    existing: existing.id,
                });
            }
        }

        let parent_id = self.closest_parent(candidate).map(|node| node.id);
        let children = self
            .displaced_children(candidate, parent_id)
            .into_iter()
            .map(|node| node.id)
            .collect();

        Ok(Placement {
            parent_id,
            children,
        })
    }

    /// New parents for the children of `removed` once it is gone
    ///
    /// Each child is placed again against the remaining nodes, excluding
    /// its own subtree. This falls back to the removed node's parent or to
    /// no parent at all.
    pub fn reparent_after_removal(&self, removed: NodeId) -> Result<Vec<Reparent>, HierarchyError> {
        if !self.by_id.contains_key(&removed) {
            return Err(HierarchyError::NodeNotFound(removed));
        }

        let mut moves = Vec::new();
        for child_id in self.child_ids(&removed) {
            let Some(child) = self.get(child_id) else {
                continue;
            };

            let mut excluded = self.subtree(*child_id);
            excluded.insert(removed);

            let to = self
                .closest_parent_excluding(&child.prefix, &excluded)
                .map(|node| node.id);
            moves.push(Reparent {
                node_id: *child_id,
                from: Some(removed),
                to,
            });
        }

        Ok(moves)
    }

    /// `root` and every node below it
    pub fn subtree(&self, root: NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.child_ids(&id).iter().copied());
            }
        }
        seen
    }

    fn child_ids(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    fn encloses(&self, parent: &Prefix, candidate: &Prefix) -> bool {
        match self.policy {
            EqualPrefixPolicy::Reject => parent.is_supernet_of(candidate),
            EqualPrefixPolicy::AllowWithDifferentiation => parent.contains(candidate),
        }
    }

    fn depth(&self, node: &NetworkNode) -> usize {
        let mut depth = 0;
        let mut current = node.parent_id;
        while let Some(id) = current {
            // Bounded in case of a corrupt snapshot with a parent loop
            if depth >= self.nodes.len() {
                break;
            }
            depth += 1;
            current = self.by_id.get(&id).and_then(|parent| parent.parent_id);
        }
        depth
    }
}
