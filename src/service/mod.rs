// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Address Space Management
//!
//! This module provides the application service layer that orchestrates
//! domain logic and event sourcing.
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! Service Layer (this module)
//!     ↓
//! Command Handler → Aggregate → Events
//!     ↓
//! Event Store (optimistic concurrency, retried on conflict)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cim_ipam::aggregate::RegisterNodeCommand;
//! use cim_ipam::config::IpamConfig;
//! use cim_ipam::domain::{AddressSpaceId, TagMap};
//! use cim_ipam::event_store::InMemoryEventStore;
//! use cim_ipam::service::{AddressSpaceService, EventSourcedAddressSpaceService};
//! use chrono::Utc;
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let service = EventSourcedAddressSpaceService::new(InMemoryEventStore::new(), IpamConfig::default());
//! let space = AddressSpaceId::new();
//!
//! let command = RegisterNodeCommand::from_cidr("10.0.0.0/8", TagMap::new(), Utc::now(), Uuid::now_v7()).unwrap();
//! let node_id = service.register_node(space, command).await.unwrap();
//!
//! let node = service.get_node(space, node_id).await.unwrap();
//! assert_eq!(node.prefix.to_string(), "10.0.0.0/8");
//! # });
//! ```

pub mod address_space;

pub use address_space::{
    AddressSpaceService, EventSourcedAddressSpaceService, ServiceError, ServiceResult,
};
