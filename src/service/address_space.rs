// Copyright (c) 2025 - Cowboy AI, Inc.
//! AddressSpace Service Layer
//!
//! Provides the application service for managing an address space through
//! event sourcing. Each write is a transaction:
//!
//! 1. Load events from the store
//! 2. Reconstruct current state
//! 3. Handle the command (pure function)
//! 4. Append the events with the version from step 2
//!
//! A concurrency conflict in step 4 means another writer got in between.
//! The whole transaction is re-run against fresh state, up to
//! [`IpamConfig::max_write_retries`] times. Validation errors are never
//! retried.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::aggregate::commands::*;
use crate::aggregate::handlers::*;
use crate::aggregate::AddressSpaceState;
use crate::config::IpamConfig;
use crate::domain::{AddressSpaceId, NetworkNode, NodeId, TagMap};
use crate::errors::IpamError;
use crate::event_store::EventStore;
use crate::events::IpamEvent;

/// Service layer result type
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service layer errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Command validation failed
    #[error("Command error: {0}")]
    CommandError(#[from] CommandError),

    /// Event store error
    #[error("Event store error: {0}")]
    EventStoreError(#[from] IpamError),

    /// Queried node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Every attempt lost the race to a concurrent writer
    #[error("{operation} gave up after {attempts} attempts on concurrency conflicts")]
    RetriesExhausted { operation: &'static str, attempts: u32 },
}

/// AddressSpace service trait
///
/// Write methods return the address space version after the write.
#[async_trait]
pub trait AddressSpaceService: Send + Sync {
    /// Register a prefix, returning the new node's id
    async fn register_node(
        &self,
        address_space_id: AddressSpaceId,
        command: RegisterNodeCommand,
    ) -> ServiceResult<NodeId>;

    async fn update_node_tags(
        &self,
        address_space_id: AddressSpaceId,
        command: UpdateNodeTagsCommand,
    ) -> ServiceResult<u64>;

    async fn update_node_prefix(
        &self,
        address_space_id: AddressSpaceId,
        command: UpdateNodePrefixCommand,
    ) -> ServiceResult<u64>;

    async fn delete_node(
        &self,
        address_space_id: AddressSpaceId,
        command: DeleteNodeCommand,
    ) -> ServiceResult<u64>;

    async fn save_tag_definition(
        &self,
        address_space_id: AddressSpaceId,
        command: SaveTagDefinitionCommand,
    ) -> ServiceResult<u64>;

    async fn delete_tag_definition(
        &self,
        address_space_id: AddressSpaceId,
        command: DeleteTagDefinitionCommand,
    ) -> ServiceResult<u64>;

    /// Current state of an address space reconstructed from events
    async fn get_address_space(&self, address_space_id: AddressSpaceId) -> ServiceResult<AddressSpaceState>;

    async fn get_node(&self, address_space_id: AddressSpaceId, node_id: NodeId) -> ServiceResult<NetworkNode>;

    /// Inheritable tags the node passes to its children
    async fn effective_tags(&self, address_space_id: AddressSpaceId, node_id: NodeId) -> ServiceResult<TagMap>;

    /// Nodes carrying `name = value` directly or by inheritance
    async fn find_by_tag(
        &self,
        address_space_id: AddressSpaceId,
        name: &str,
        value: &str,
    ) -> ServiceResult<Vec<NetworkNode>>;
}

/// Event-sourced implementation of AddressSpaceService
pub struct EventSourcedAddressSpaceService<S: EventStore> {
    event_store: S,
    config: IpamConfig,
}

impl<S: EventStore> EventSourcedAddressSpaceService<S> {
    /// Create a new event-sourced service
    pub fn new(event_store: S, config: IpamConfig) -> Self {
        Self { event_store, config }
    }

    pub fn config(&self) -> &IpamConfig {
        &self.config
    }

    pub fn event_store(&self) -> &S {
        &self.event_store
    }

    /// Load current state from event store
    async fn load_state(&self, address_space_id: AddressSpaceId) -> ServiceResult<AddressSpaceState> {
        let events: Vec<IpamEvent> = self
            .event_store
            .read_events(address_space_id)
            .await?
            .into_iter()
            .map(|stored| stored.data)
            .collect();

        Ok(AddressSpaceState::from_events(address_space_id, &events))
    }

    /// Read, handle, append; re-run on concurrency conflicts
    async fn execute<C, H>(
        &self,
        address_space_id: AddressSpaceId,
        operation: &'static str,
        command: C,
        handler: H,
    ) -> ServiceResult<u64>
    where
        C: Clone + Send + Sync,
        H: Fn(&AddressSpaceState, C, &IpamConfig) -> Result<Vec<IpamEvent>, CommandError> + Send + Sync,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let state = self.load_state(address_space_id).await?;
            let events = handler(&state, command.clone(), &self.config)?;

            if events.is_empty() {
                debug!(address_space = %address_space_id, operation, "Command produced no events");
                return Ok(state.version);
            }

            let count = events.len();
            match self
                .event_store
                .append(address_space_id, events, Some(state.version))
                .await
            {
                Ok(version) => {
                    info!(
                        address_space = %address_space_id,
                        operation,
                        events = count,
                        version,
                        attempts,
                        "Command applied"
                    );
                    return Ok(version);
                }
                Err(IpamError::ConcurrencyConflict { expected, actual })
                    if attempts <= self.config.max_write_retries =>
                {
                    warn!(
                        address_space = %address_space_id,
                        operation,
                        expected,
                        actual,
                        attempts,
                        "Concurrent write detected, retrying"
                    );
                }
                Err(IpamError::ConcurrencyConflict { .. }) => {
                    return Err(ServiceError::RetriesExhausted { operation, attempts });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[async_trait]
impl<S: EventStore> AddressSpaceService for EventSourcedAddressSpaceService<S> {
    async fn register_node(
        &self,
        address_space_id: AddressSpaceId,
        command: RegisterNodeCommand,
    ) -> ServiceResult<NodeId> {
        let node_id = command.node_id;
        self.execute(address_space_id, "register_node", command, handle_register_node)
            .await?;
        Ok(node_id)
    }

    async fn update_node_tags(
        &self,
        address_space_id: AddressSpaceId,
        command: UpdateNodeTagsCommand,
    ) -> ServiceResult<u64> {
        self.execute(address_space_id, "update_node_tags", command, handle_update_node_tags)
            .await
    }

    async fn update_node_prefix(
        &self,
        address_space_id: AddressSpaceId,
        command: UpdateNodePrefixCommand,
    ) -> ServiceResult<u64> {
        self.execute(address_space_id, "update_node_prefix", command, handle_update_node_prefix)
            .await
    }

    async fn delete_node(
        &self,
        address_space_id: AddressSpaceId,
        command: DeleteNodeCommand,
    ) -> ServiceResult<u64> {
        self.execute(address_space_id, "delete_node", command, handle_delete_node)
            .await
    }

    async fn save_tag_definition(
        &self,
        address_space_id: AddressSpaceId,
        command: SaveTagDefinitionCommand,
    ) -> ServiceResult<u64> {
        self.execute(address_space_id, "save_tag_definition", command, handle_save_tag_definition)
            .await
    }

    async fn delete_tag_definition(
        &self,
        address_space_id: AddressSpaceId,
        command: DeleteTagDefinitionCommand,
    ) -> ServiceResult<u64> {
        self.execute(
            address_space_id,
            "delete_tag_definition",
            command,
            handle_delete_tag_definition,
        )
        .await
    }

    async fn get_address_space(&self, address_space_id: AddressSpaceId) -> ServiceResult<AddressSpaceState> {
        self.load_state(address_space_id).await
    }

    async fn get_node(&self, address_space_id: AddressSpaceId, node_id: NodeId) -> ServiceResult<NetworkNode> {
        let state = self.load_state(address_space_id).await?;
        state
            .node(&node_id)
            .cloned()
            .ok_or(ServiceError::NodeNotFound(node_id))
    }

    async fn effective_tags(&self, address_space_id: AddressSpaceId, node_id: NodeId) -> ServiceResult<TagMap> {
        let state = self.load_state(address_space_id).await?;
        state
            .effective_tags(&node_id)
            .ok_or(ServiceError::NodeNotFound(node_id))
    }

    async fn find_by_tag(
        &self,
        address_space_id: AddressSpaceId,
        name: &str,
        value: &str,
    ) -> ServiceResult<Vec<NetworkNode>> {
        let state = self.load_state(address_space_id).await?;
        Ok(state
            .find_by_tag(name, value)
            .into_iter()
            .cloned()
            .collect())
    }
}
