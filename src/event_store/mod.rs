// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! This module defines the event storage interface for persisting and
//! retrieving address space events.
//!
//! # Architecture
//!
//! ```text
//! Command → Aggregate → Events → EventStore → Persistent Storage
//! ```
//!
//! # Event Store Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: Events keep their sequence within an address space
//! 3. **Optimistic Concurrency**: Appends carry the version they were
//!    validated against
//! 4. **Replay**: State is reconstructed from the full stream
//!
//! # Example
//!
//! ```rust
//! use cim_ipam::event_store::{EventStore, InMemoryEventStore};
//! use cim_ipam::domain::AddressSpaceId;
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryEventStore::new();
//! let space = AddressSpaceId::new();
//!
//! assert_eq!(store.get_version(space).await.unwrap(), None);
//! assert!(store.read_events(space).await.unwrap().is_empty());
//! # });
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::AddressSpaceId;
use crate::errors::IpamResult;
use crate::events::IpamEvent;

pub mod memory;

pub use memory::InMemoryEventStore;

/// Stored event envelope with sequencing and correlation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent<E> {
    /// Unique event ID (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// Address space this event belongs to
    pub aggregate_id: AddressSpaceId,

    /// Sequence number within the address space stream, starting at 1
    pub sequence: u64,

    /// Event timestamp (when it occurred)
    pub timestamp: DateTime<Utc>,

    /// When the store accepted the event
    pub stored_at: DateTime<Utc>,

    pub correlation_id: Uuid,

    pub causation_id: Option<Uuid>,

    /// Event type name
    pub event_type: String,

    /// The actual domain event data
    pub data: E,
}

impl StoredEvent<IpamEvent> {
    /// Wrap `event` at position `sequence`
    pub fn wrap(aggregate_id: AddressSpaceId, sequence: u64, event: IpamEvent, stored_at: DateTime<Utc>) -> Self {
        let metadata = event.metadata();
        Self {
            event_id: metadata.event_id,
            aggregate_id,
            sequence,
            timestamp: metadata.timestamp,
            stored_at,
            correlation_id: metadata.correlation_id,
            causation_id: metadata.causation_id,
            event_type: event.event_type().to_string(),
            data: event,
        }
    }
}

/// Event Store trait for persisting and retrieving address space events
///
/// Implementations must append a batch atomically: either every event is
/// stored or none is.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append events to an address space's stream
    ///
    /// # Arguments
    ///
    /// * `aggregate_id` - The address space these events belong to
    /// * `events` - Events to append
    /// * `expected_version` - Version the events were validated against;
    ///   `None` skips the check
    ///
    /// # Returns
    ///
    /// The new version after appending events
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if `expected_version` doesn't match the current version
    /// - `Storage` if an event belongs to a different address space
    async fn append(
        &self,
        aggregate_id: AddressSpaceId,
        events: Vec<IpamEvent>,
        expected_version: Option<u64>,
    ) -> IpamResult<u64>;

    /// Read all events for an address space, in the order they were written
    async fn read_events(&self, aggregate_id: AddressSpaceId) -> IpamResult<Vec<StoredEvent<IpamEvent>>>;

    /// Read events with `sequence >= from_version`
    async fn read_events_from(
        &self,
        aggregate_id: AddressSpaceId,
        from_version: u64,
    ) -> IpamResult<Vec<StoredEvent<IpamEvent>>>;

    /// Read all events sharing `correlation_id`, across address spaces
    async fn read_by_correlation(&self, correlation_id: Uuid) -> IpamResult<Vec<StoredEvent<IpamEvent>>>;

    /// Highest sequence number, or None if the address space has no events
    async fn get_version(&self, aggregate_id: AddressSpaceId) -> IpamResult<Option<u64>>;
}
