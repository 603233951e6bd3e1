// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPAM Domain Events
//!
//! Events are immutable facts representing state changes to an address
//! space. Nodes and tag definitions of one address space share a single
//! stream, so that every write validates against one consistent snapshot.
//!
//! # Event Flow
//!
//! ```text
//! Command → Handler → Events → EventStore → AddressSpaceState
//!   (intent)  (validate)  (facts)   (persist)     (fold)
//! ```
//!
//! # Correlation and Causation
//!
//! - **correlation_id**: Shared by every event produced for one request
//! - **causation_id**: The command's causation for the first event of a
//!   batch, then the previous event's id
//!
//! ```text
//! DeleteNode (causation: None)
//!   ↓
//! NodeTagsUpdated    event_id: evt-1, causation_id: None
//!   ↓
//! NodesReparented    event_id: evt-2, causation_id: evt-1
//!   ↓
//! NodeDeleted        event_id: evt-3, causation_id: evt-2
//! ```

pub mod address_space;

pub use address_space::{
    EventMetadata, IpamEvent, NodeDeleted, NodePrefixChanged, NodeRegistered, NodeTagsUpdated,
    NodesReparented, TagDefinitionDeleted, TagDefinitionSaved, EVENT_VERSION,
};
