// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Event Store
//!
//! Keeps each address space's stream as serialized JSON envelopes behind a
//! `tokio` read-write lock. Events go through the same serde round trip a
//! durable store would apply.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::AddressSpaceId;
use crate::errors::{IpamError, IpamResult};
use crate::event_store::{EventStore, StoredEvent};
use crate::events::IpamEvent;

type Streams = HashMap<AddressSpaceId, Vec<Vec<u8>>>;

/// Event store backed by process memory
///
/// Cloning shares the underlying streams.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<Streams>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of address spaces with at least one event
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    fn decode(payload: &[u8]) -> IpamResult<StoredEvent<IpamEvent>> {
        serde_json::from_slice(payload).map_err(|e| IpamError::Deserialization(e.to_string()))
    }

    fn decode_all<'a>(
        payloads: impl IntoIterator<Item = &'a Vec<u8>>,
    ) -> IpamResult<Vec<StoredEvent<IpamEvent>>> {
        payloads.into_iter().map(|payload| Self::decode(payload)).collect()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        aggregate_id: AddressSpaceId,
        events: Vec<IpamEvent>,
        expected_version: Option<u64>,
    ) -> IpamResult<u64> {
        if let Some(foreign) = events.iter().find(|e| e.address_space_id() != aggregate_id) {
            return Err(IpamError::Storage(format!(
                "Event {} belongs to address space {}, not {}",
                foreign.event_id(),
                foreign.address_space_id(),
                aggregate_id
            )));
        }

        let mut streams = self.streams.write().await;
        let current = streams.get(&aggregate_id).map_or(0, |s| s.len() as u64);

        if let Some(expected) = expected_version {
            if expected != current {
                warn!(
                    address_space = %aggregate_id,
                    expected,
                    actual = current,
                    "Rejecting append on stale version"
                );
                return Err(IpamError::ConcurrencyConflict {
                    expected,
                    actual: current,
                });
            }
        }

        // Serialize the whole batch before touching the stream
        let stored_at = Utc::now();
        let payloads = events
            .into_iter()
            .zip(current + 1..)
            .map(|(event, sequence)| {
                serde_json::to_vec(&StoredEvent::wrap(aggregate_id, sequence, event, stored_at))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let appended = payloads.len() as u64;
        streams.entry(aggregate_id).or_default().extend(payloads);
        let version = current + appended;

        debug!(
            address_space = %aggregate_id,
            appended,
            version,
            "Appended events"
        );

        Ok(version)
    }

    async fn read_events(&self, aggregate_id: AddressSpaceId) -> IpamResult<Vec<StoredEvent<IpamEvent>>> {
        let streams = self.streams.read().await;
        match streams.get(&aggregate_id) {
            Some(stream) => Self::decode_all(stream),
            None => Ok(Vec::new()),
        }
    }

    async fn read_events_from(
        &self,
        aggregate_id: AddressSpaceId,
        from_version: u64,
    ) -> IpamResult<Vec<StoredEvent<IpamEvent>>> {
        let streams = self.streams.read().await;
        let Some(stream) = streams.get(&aggregate_id) else {
            return Ok(Vec::new());
        };

        let skip = from_version.saturating_sub(1) as usize;
        Self::decode_all(stream.iter().skip(skip))
    }

    async fn read_by_correlation(&self, correlation_id: Uuid) -> IpamResult<Vec<StoredEvent<IpamEvent>>> {
        let streams = self.streams.read().await;
        let mut matching = Vec::new();
        for stream in streams.values() {
            for payload in stream {
                let stored = Self::decode(payload)?;
                if stored.correlation_id == correlation_id {
                    matching.push(stored);
                }
            }
        }

        matching.sort_by_key(|stored| (stored.timestamp, stored.event_id));
        info!(%correlation_id, count = matching.len(), "Read correlation chain");
        Ok(matching)
    }

    async fn get_version(&self, aggregate_id: AddressSpaceId) -> IpamResult<Option<u64>> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&aggregate_id)
            .filter(|stream| !stream.is_empty())
            .map(|stream| stream.len() as u64))
    }
}
