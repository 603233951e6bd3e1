// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Aggregates
//!
//! This module provides the functional aggregate pattern for event sourcing:
//! - Handlers are pure functions: State → Command → Result<Vec<Event>, Error>
//! - State reconstruction via event folding: [Event] → State
//! - All state changes represented as events
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → Aggregate → Events → Event Store
//!    ↓          ↓          ↓
//! Intent   Validation  Facts
//! ```
//!
//! # Fold Pattern
//!
//! ```rust,ignore
//! let initial = AddressSpaceState::new(space_id);
//! let state = events.iter().fold(initial, apply_event);
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use cim_ipam::aggregate::*;
//! use cim_ipam::config::IpamConfig;
//! use cim_ipam::domain::{AddressSpaceId, TagMap};
//! use chrono::Utc;
//! use uuid::Uuid;
//!
//! let state = AddressSpaceState::new(AddressSpaceId::new());
//! let command = RegisterNodeCommand::from_cidr(
//!     "10.0.0.0/8",
//!     TagMap::new(),
//!     Utc::now(),
//!     Uuid::now_v7(),
//! )
//! .unwrap();
//!
//! let events = handle_register_node(&state, command, &IpamConfig::default()).unwrap();
//! let state = events.iter().fold(state, apply_event);
//! assert_eq!(state.roots().count(), 1);
//! ```
//!
//! # Time as Parameter
//!
//! Handlers never call `Utc::now()`. Timestamps arrive in commands.

pub mod address_space;
pub mod commands;
pub mod handlers;

pub use address_space::{apply_event, AddressSpaceState};
pub use commands::*;
pub use handlers::*;
