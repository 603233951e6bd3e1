// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tag Inheritance Invariants
//!
//! The composite check run whenever a node's tags or hierarchy position
//! change. All functions are pure: they take the node's direct tags, the
//! resolved parent's effective tags and the address space's [`TagSchema`],
//! and return either the expanded tag map to persist or a typed failure.
//!
//! # Validation Steps
//!
//! 1. **Implication expansion** to a fixed point over the direct tags
//! 2. **Known values** for every expanded assignment
//! 3. **Inheritance conflicts** against the parent's effective tags
//! 4. **Equal-prefix differentiation** when the node repeats its parent's network:
//!    the node's own inheritable tags must outnumber the parent's effective tags
//!
//! Validation is all-or-nothing. A failure means none of the expanded tags
//! may be persisted.

use std::collections::VecDeque;

use crate::domain::implication::{expand_implications, validate_known_value};
use crate::domain::prefix::Prefix;
use crate::domain::tag::{TagAssignment, TagMap, TagSchema};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Tag validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An implication would give an already-assigned tag a different value
    #[error("Tag '{tag}' implied as '{implied}' by {implied_by} conflicts with value '{existing}'")]
    ImplicationConflict {
        tag: String,
        existing: String,
        implied: String,
        implied_by: String,
    },

    /// Value outside the tag's known values
    #[error("Value '{value}' is not a known value of tag '{tag}'")]
    UnknownTagValue { tag: String, value: String },

    /// Child overrides an inherited tag with a different value
    #[error("Tag '{tag}' is inherited as '{parent_value}' but the node assigns '{child_value}'")]
    InheritanceConflict {
        tag: String,
        parent_value: String,
        child_value: String,
    },

    /// Equal-prefix child carries no more inheritable tags than its parent's effective set
    #[error(
        "Prefix {prefix} repeats its parent's network with {node_count} inheritable tags; \
         more than {parent_count} required"
    )]
    InsufficientDifferentiation {
        prefix: Prefix,
        node_count: usize,
        parent_count: usize,
    },
}

/// The resolved parent of a node being validated
#[derive(Debug, Clone, Copy)]
pub struct ParentContext<'a> {
    pub prefix: &'a Prefix,
    /// Direct and inherited tags of the parent, inheritable ones only
    pub effective_tags: &'a TagMap,
}

/// Stateless validator over one address space's tag schema
#[derive(Debug, Clone, Copy)]
pub struct TagInheritanceValidator<'a> {
    schema: &'a TagSchema,
}

impl<'a> TagInheritanceValidator<'a> {
    pub fn new(schema: &'a TagSchema) -> Self {
        Self { schema }
    }

    /// Run all four steps and return the expanded tags to persist
    pub fn validate(
        &self,
        prefix: &Prefix,
        direct_tags: &TagMap,
        parent: Option<&ParentContext<'_>>,
    ) -> Result<TagMap, ValidationError> {
        let expanded = self.expand(direct_tags)?;

        for (name, value) in &expanded {
            if let Some(definition) = self.schema.get(name) {
                validate_known_value(definition, value)?;
            }
        }

        self.check_against_parent(prefix, &expanded, parent)?;

        Ok(expanded)
    }

    /// Expand implications to a fixed point
    ///
    /// Terminates because each tag name enters the map at most once.
    pub fn expand(&self, direct_tags: &TagMap) -> Result<TagMap, ValidationError> {
        let mut expanded = direct_tags.clone();
        let mut pending: VecDeque<TagAssignment> = direct_tags
            .iter()
            .map(|(name, value)| TagAssignment::direct(name.clone(), value.clone()))
            .collect();

        while let Some(assignment) = pending.pop_front() {
            for implied in expand_implications(self.schema, &assignment, &expanded)? {
                expanded.insert(implied.name.clone(), implied.value.clone());
                pending.push_back(implied);
            }
        }

        Ok(expanded)
    }

    /// Steps 3 and 4 only, for tags already expanded and value-checked
    ///
    /// Used to re-check descendants when the tags they inherit change.
    pub fn check_against_parent(
        &self,
        prefix: &Prefix,
        tags: &TagMap,
        parent: Option<&ParentContext<'_>>,
    ) -> ValidationResult {
        let Some(parent) = parent else {
            return Ok(());
        };

        for (name, parent_value) in parent.effective_tags {
            if let Some(child_value) = tags.get(name) {
                if child_value != parent_value {
                    return Err(ValidationError::InheritanceConflict {
                        tag: name.clone(),
                        parent_value: parent_value.clone(),
                        child_value: child_value.clone(),
                    });
                }
            }
        }

        if parent.prefix.same_network(prefix) {
            let parent_count = parent.effective_tags.len();
            let node_count = tags
                .keys()
                .filter(|name| self.schema.is_inheritable(name))
                .count();
            if node_count <= parent_count {
                return Err(ValidationError::InsufficientDifferentiation {
                    prefix: *prefix,
                    node_count,
                    parent_count,
                });
            }
        }

        Ok(())
    }

    /// Parent's effective tags plus this node's inheritable tags
    ///
    /// Non-inheritable tags stop here and never reach descendants.
    pub fn effective_tags(&self, own: &TagMap, parent_effective: &TagMap) -> TagMap {
        let mut effective = parent_effective.clone();
        for (name, value) in own {
            if self.schema.is_inheritable(name) {
                effective
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        effective
    }

    /// Effective tags at the end of a root-first chain of direct tag maps
    pub fn effective_tags_for_chain<'t>(
        &self,
        chain: impl IntoIterator<Item = &'t TagMap>,
    ) -> TagMap {
        chain
            .into_iter()
            .fold(TagMap::new(), |effective, own| self.effective_tags(own, &effective))
    }
}
