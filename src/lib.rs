//! IP address management for the Composable Information Machine
//!
//! Hierarchical address spaces of IPv4/IPv6 prefixes annotated with typed,
//! inheritable tags. The pure core lives in [`domain`] and [`hierarchy`];
//! [`aggregate`], [`event_store`] and [`service`] drive it through an
//! event-sourced write path.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod hierarchy;
pub mod service;

// Re-export commonly used types
pub use config::IpamConfig;
pub use domain::{
    AddressSpaceId, NetworkNode, NodeId, Prefix, PrefixError, TagDefinition, TagInheritanceValidator,
    TagSchema, TagType,
};
pub use errors::{IpamError, IpamResult};
pub use events::IpamEvent;
pub use hierarchy::{EqualPrefixPolicy, PrefixIndex};
