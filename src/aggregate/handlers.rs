// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Handlers for the AddressSpace Aggregate
//!
//! Handlers are pure functions of the current state, the command and the
//! configuration:
//!
//! ```text
//! handle_command(&State, Command, &IpamConfig) → Result<Vec<Event>, CommandError>
//! ```
//!
//! Every handler follows the same control flow:
//!
//! 1. Placement via [`PrefixIndex`] (parent, displaced children)
//! 2. Tag validation via [`TagInheritanceValidator`] against the parent's
//!    effective tags
//! 3. Projection of the candidate events onto a copy of the state and
//!    re-validation of every affected subtree
//!
//! Events are returned only when all three succeed. A rejected command
//! produces no events.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::address_space::{apply_event, AddressSpaceState};
use crate::aggregate::commands::*;
use crate::config::IpamConfig;
use crate::domain::{
    validate_acyclic, validate_known_value, AddressSpaceId, NodeId, ParentContext, PrefixError,
    SchemaError, TagInheritanceValidator, TagMap, TagSchema, ValidationError,
};
use crate::events::*;
use crate::hierarchy::{HierarchyError, PrefixIndex, Reparent};

/// Command validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Prefix(#[from] PrefixError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node already exists: {0}")]
    NodeAlreadyExists(NodeId),

    /// Tag definition addressed to another address space
    #[error("Tag definition belongs to address space {actual}, expected {expected}")]
    WrongAddressSpace {
        expected: AddressSpaceId,
        actual: AddressSpaceId,
    },
}

/// Events of one command, chained by causation
struct EventBatch {
    address_space_id: AddressSpaceId,
    timestamp: DateTime<Utc>,
    correlation_id: Uuid,
    causation_id: Option<Uuid>,
    events: Vec<IpamEvent>,
}

impl EventBatch {
    fn new(
        state: &AddressSpaceState,
        timestamp: DateTime<Utc>,
        correlation_id: Uuid,
        causation_id: Option<Uuid>,
    ) -> Self {
        Self {
            address_space_id: state.id,
            timestamp,
            correlation_id,
            causation_id,
            events: Vec::new(),
        }
    }

    /// Metadata for the next event; it becomes the cause of the one after
    fn metadata(&mut self) -> EventMetadata {
        let metadata = EventMetadata::new(
            self.address_space_id,
            self.timestamp,
            self.correlation_id,
            self.causation_id,
        );
        self.causation_id = Some(metadata.event_id);
        metadata
    }

    fn reparent(&mut self, moves: Vec<Reparent>) {
        if moves.is_empty() {
            return;
        }
        let metadata = self.metadata();
        self.events
            .push(IpamEvent::NodesReparented(NodesReparented { metadata, moves }));
    }

    fn update_tags(&mut self, node_id: NodeId, tags: TagMap) {
        let metadata = self.metadata();
        self.events.push(IpamEvent::NodeTagsUpdated(NodeTagsUpdated {
            metadata,
            node_id,
            tags,
        }));
    }

    fn push(&mut self, event: IpamEvent) {
        self.events.push(event);
    }

    /// State after the events recorded so far
    fn project(&self, state: &AddressSpaceState) -> AddressSpaceState {
        self.events.iter().fold(state.clone(), apply_event)
    }

    fn into_events(self) -> Vec<IpamEvent> {
        self.events
    }
}

/// Handle RegisterNode command
///
/// # Business Rules
/// - Node id must be new
/// - Prefix must not duplicate an existing node (unless the equal-prefix
///   policy allows it)
/// - Tags must expand, use known values and agree with inherited tags
/// - Displaced children must still validate under the new node
pub fn handle_register_node(
    state: &AddressSpaceState,
    command: RegisterNodeCommand,
    config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    if state.node(&command.node_id).is_some() {
        return Err(CommandError::NodeAlreadyExists(command.node_id));
    }

    let index = state.prefix_index(config.equal_prefix_policy);
    let placement = index.placement(&command.prefix)?;

    let validator = TagInheritanceValidator::new(&state.schema);
    let parent = placement.parent_id.and_then(|id| state.node(&id));
    let parent_effective = placement
        .parent_id
        .and_then(|id| state.effective_tags(&id))
        .unwrap_or_default();
    let context = parent.map(|node| ParentContext {
        prefix: &node.prefix,
        effective_tags: &parent_effective,
    });
    let tags = validator.validate(&command.prefix, &command.tags, context.as_ref())?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );
    let metadata = batch.metadata();
    batch.push(IpamEvent::NodeRegistered(NodeRegistered {
        metadata,
        node_id: command.node_id,
        prefix: command.prefix,
        tags,
        parent_id: placement.parent_id,
    }));
    batch.reparent(
        placement
            .children
            .iter()
            .map(|child| Reparent {
                node_id: *child,
                from: placement.parent_id,
                to: Some(command.node_id),
            })
            .collect(),
    );

    let projected = batch.project(state);
    for (node_id, tags) in revalidate_subtrees(&projected, &projected.schema, &[command.node_id])? {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Handle UpdateNodeTags command
///
/// # Business Rules
/// - Node must exist
/// - New tags must validate against the parent's effective tags
/// - Every descendant must still validate against the changed inheritance
pub fn handle_update_node_tags(
    state: &AddressSpaceState,
    command: UpdateNodeTagsCommand,
    _config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    let node = state
        .node(&command.node_id)
        .ok_or(CommandError::NodeNotFound(command.node_id))?;

    let validator = TagInheritanceValidator::new(&state.schema);
    let parent = node.parent_id.and_then(|id| state.node(&id));
    let parent_effective = state.inherited_tags(&node.id);
    let context = parent.map(|parent| ParentContext {
        prefix: &parent.prefix,
        effective_tags: &parent_effective,
    });
    let tags = validator.validate(&node.prefix, &command.tags, context.as_ref())?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );
    if tags == node.tags {
        return Ok(batch.into_events());
    }
    batch.update_tags(node.id, tags);

    let projected = batch.project(state);
    for (node_id, tags) in revalidate_subtrees(&projected, &projected.schema, &[node.id])? {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Handle UpdateNodePrefix command
///
/// Treated as a removal followed by a re-insertion:
/// 1. The node's children are re-parented as if it were deleted
/// 2. The node is placed again under its new prefix, taking the nodes the
///    new prefix encloses
/// 3. The whole tree is re-validated
pub fn handle_update_node_prefix(
    state: &AddressSpaceState,
    command: UpdateNodePrefixCommand,
    config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    let node = state
        .node(&command.node_id)
        .ok_or(CommandError::NodeNotFound(command.node_id))?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );
    if node.prefix == command.prefix {
        return Ok(batch.into_events());
    }

    let released = state
        .prefix_index(config.equal_prefix_policy)
        .reparent_after_removal(node.id)?;
    batch.reparent(released);

    let interim = batch.project(state);
    let placement = PrefixIndex::new(interim.nodes().filter(|other| other.id != node.id))
        .with_policy(config.equal_prefix_policy)
        .placement(&command.prefix)?;

    let metadata = batch.metadata();
    batch.push(IpamEvent::NodePrefixChanged(NodePrefixChanged {
        metadata,
        node_id: node.id,
        old_prefix: node.prefix,
        new_prefix: command.prefix,
        parent_id: placement.parent_id,
    }));
    batch.reparent(
        placement
            .children
            .iter()
            .map(|child| Reparent {
                node_id: *child,
                from: placement.parent_id,
                to: Some(node.id),
            })
            .collect(),
    );

    let projected = batch.project(state);
    for (node_id, tags) in revalidate_tree(&projected, &projected.schema)? {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Handle DeleteNode command
///
/// # Business Rules
/// - Node must exist
/// - With `push_down_tags_on_delete`, the node's direct inheritable tags
///   become direct tags of its former children
/// - Former children are re-parented to their closest remaining enclosing node
pub fn handle_delete_node(
    state: &AddressSpaceState,
    command: DeleteNodeCommand,
    config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    let node = state
        .node(&command.node_id)
        .ok_or(CommandError::NodeNotFound(command.node_id))?;

    let released = state
        .prefix_index(config.equal_prefix_policy)
        .reparent_after_removal(node.id)?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );

    if config.push_down_tags_on_delete {
        let validator = TagInheritanceValidator::new(&state.schema);

        for reparent in &released {
            let Some(child) = state.node(&reparent.node_id) else {
                continue;
            };

            let mut pushed = child.tags.clone();
            for (name, value) in &node.tags {
                if state.schema.is_inheritable(name) {
                    pushed.entry(name.clone()).or_insert_with(|| value.clone());
                }
            }

            let new_parent = reparent.to.and_then(|id| state.node(&id));
            let parent_effective = reparent
                .to
                .and_then(|id| state.effective_tags(&id))
                .unwrap_or_default();
            let context = new_parent.map(|parent| ParentContext {
                prefix: &parent.prefix,
                effective_tags: &parent_effective,
            });
            let tags = validator.validate(&child.prefix, &pushed, context.as_ref())?;

            if tags != child.tags {
                batch.update_tags(child.id, tags);
            }
        }
    }

    batch.reparent(released);
    let metadata = batch.metadata();
    batch.push(IpamEvent::NodeDeleted(NodeDeleted {
        metadata,
        node_id: node.id,
        prefix: node.prefix,
    }));

    let projected = batch.project(state);
    for (node_id, tags) in revalidate_tree(&projected, &projected.schema)? {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Handle SaveTagDefinition command
///
/// # Business Rules
/// - Definition must belong to this address space and have a name
/// - The implication graph of the resulting schema must stay acyclic
/// - Implied values must be known values of constrained targets
/// - Every existing node must still validate; nodes whose tags gain new
///   implications are updated in the same batch
pub fn handle_save_tag_definition(
    state: &AddressSpaceState,
    command: SaveTagDefinitionCommand,
    _config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    let definition = command.definition;
    if definition.address_space_id != state.id {
        return Err(CommandError::WrongAddressSpace {
            expected: state.id,
            actual: definition.address_space_id,
        });
    }
    if definition.name.trim().is_empty() {
        return Err(SchemaError::EmptyName.into());
    }

    let candidate = state.schema.with(definition.clone());
    validate_acyclic(&candidate)?;
    validate_implied_values(&candidate)?;
    let updates = revalidate_tree(state, &candidate)?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );
    let metadata = batch.metadata();
    batch.push(IpamEvent::TagDefinitionSaved(TagDefinitionSaved {
        metadata,
        definition,
    }));
    for (node_id, tags) in updates {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Handle DeleteTagDefinition command
///
/// # Business Rules
/// - Definition must exist
/// - No other definition may still imply it
/// - Existing nodes must still validate once the tag becomes free-form
pub fn handle_delete_tag_definition(
    state: &AddressSpaceState,
    command: DeleteTagDefinitionCommand,
    _config: &IpamConfig,
) -> Result<Vec<IpamEvent>, CommandError> {
    if !state.schema.contains(&command.name) {
        return Err(SchemaError::DefinitionNotFound(command.name).into());
    }

    if let Some(referrer) = state.schema.definitions().find(|definition| {
        definition.name != command.name
            && definition
                .implied_tag_names()
                .any(|implied| implied == command.name)
    }) {
        return Err(SchemaError::DefinitionReferenced {
            name: command.name,
            referenced_by: referrer.name.clone(),
        }
        .into());
    }

    let mut candidate = state.schema.clone();
    candidate.remove(&command.name);
    let updates = revalidate_tree(state, &candidate)?;

    let mut batch = EventBatch::new(
        state,
        command.timestamp,
        command.correlation_id,
        command.causation_id,
    );
    let metadata = batch.metadata();
    batch.push(IpamEvent::TagDefinitionDeleted(TagDefinitionDeleted {
        metadata,
        name: command.name,
    }));
    for (node_id, tags) in updates {
        batch.update_tags(node_id, tags);
    }

    Ok(batch.into_events())
}

/// Every implied value must be allowed by its target's definition
fn validate_implied_values(schema: &TagSchema) -> Result<(), ValidationError> {
    for definition in schema.definitions() {
        for (implied_name, implied_value) in definition.implications.values().flatten() {
            if let Some(target) = schema.get(implied_name) {
                validate_known_value(target, implied_value)?;
            }
        }
    }
    Ok(())
}

/// Re-validate every node, root first, under `schema`
fn revalidate_tree(
    state: &AddressSpaceState,
    schema: &TagSchema,
) -> Result<Vec<(NodeId, TagMap)>, ValidationError> {
    let roots: Vec<NodeId> = state.roots().map(|node| node.id).collect();
    revalidate_subtrees(state, schema, &roots)
}

/// Re-validate each node in `starts` and everything below it under `schema`
///
/// Returns the nodes whose stored tags are no longer a fixed point of
/// implication expansion, with their expanded tags.
fn revalidate_subtrees(
    state: &AddressSpaceState,
    schema: &TagSchema,
    starts: &[NodeId],
) -> Result<Vec<(NodeId, TagMap)>, ValidationError> {
    let validator = TagInheritanceValidator::new(schema);
    let mut changed = Vec::new();

    for start in starts {
        let Some(node) = state.node(start) else {
            continue;
        };
        let parent_prefix = node
            .parent_id
            .and_then(|id| state.node(&id))
            .map(|parent| parent.prefix);
        let parent_effective = node
            .parent_id
            .and_then(|id| state.effective_tags_under(&id, schema))
            .unwrap_or_default();

        let mut stack = vec![(node, parent_prefix, parent_effective)];
        while let Some((node, parent_prefix, parent_effective)) = stack.pop() {
            let context = parent_prefix.as_ref().map(|prefix| ParentContext {
                prefix,
                effective_tags: &parent_effective,
            });
            let expanded = validator.validate(&node.prefix, &node.tags, context.as_ref())?;
            let effective = validator.effective_tags(&expanded, &parent_effective);

            for child_id in &node.children_ids {
                if let Some(child) = state.node(child_id) {
                    stack.push((child, Some(node.prefix), effective.clone()));
                }
            }

            if expanded != node.tags {
                changed.push((node.id, expanded));
            }
        }
    }

    Ok(changed)
}
