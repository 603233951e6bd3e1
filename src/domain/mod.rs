// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPAM Domain Models
//!
//! Pure value objects and validation rules for hierarchical address
//! management. Nothing in this module performs I/O or keeps state between
//! calls.
//!
//! # Value Objects with Invariants
//!
//! - [`Prefix`] - IPv4/IPv6 CIDR prefix with containment and subnetting
//! - [`TagDefinition`] - Typed tag schema with known values and implications
//! - [`TagSchema`] - All tag definitions of one address space
//!
//! # Entities
//!
//! - [`NetworkNode`] - A registered prefix with direct tags and hierarchy links
//!
//! # Rules
//!
//! - [`validate_acyclic`] - Tag implication graph must be a DAG
//! - [`TagInheritanceValidator`] - Expansion, known values, inheritance and
//!   equal-prefix differentiation

pub mod implication;
pub mod invariants;
pub mod network;
pub mod prefix;
pub mod tag;

pub use implication::{expand_implications, validate_acyclic, validate_known_value, ImplicationGraph};
pub use invariants::{ParentContext, TagInheritanceValidator, ValidationError, ValidationResult};
pub use network::{AddressSpaceId, NetworkNode, NodeId};
pub use prefix::{IpFamily, Prefix, PrefixError, Subnets};
pub use tag::{SchemaError, TagAssignment, TagDefinition, TagMap, TagSchema, TagType};
