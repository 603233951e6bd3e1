// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPAM configuration
//!
//! Policy knobs consulted by the command handlers and the service layer.
//! Values come from [`Default`] or from `IPAM_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::errors::{IpamError, IpamResult};
use crate::hierarchy::EqualPrefixPolicy;

/// Environment variable selecting [`EqualPrefixPolicy`]
pub const ENV_EQUAL_PREFIX_POLICY: &str = "IPAM_EQUAL_PREFIX_POLICY";
/// Environment variable toggling tag push-down on node deletion
pub const ENV_PUSH_DOWN_TAGS: &str = "IPAM_PUSH_DOWN_TAGS";
/// Environment variable bounding retries after a concurrency conflict
pub const ENV_MAX_WRITE_RETRIES: &str = "IPAM_MAX_WRITE_RETRIES";

/// Configuration for address space writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfig {
    /// How a prefix equal to an existing node is placed
    pub equal_prefix_policy: EqualPrefixPolicy,
    /// Copy a deleted node's direct inheritable tags onto its former children
    pub push_down_tags_on_delete: bool,
    /// Re-runs of read-validate-append after a concurrency conflict
    pub max_write_retries: u32,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            equal_prefix_policy: EqualPrefixPolicy::Reject,
            push_down_tags_on_delete: true,
            max_write_retries: 3,
        }
    }
}

impl IpamConfig {
    /// Defaults overridden by any `IPAM_*` variables set in the environment
    pub fn from_env() -> IpamResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IpamResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_EQUAL_PREFIX_POLICY) {
            config.equal_prefix_policy = value
                .parse()
                .map_err(|e| IpamError::Configuration(format!("{ENV_EQUAL_PREFIX_POLICY}: {e}")))?;
        }

        if let Some(value) = lookup(ENV_PUSH_DOWN_TAGS) {
            config.push_down_tags_on_delete = parse_bool(&value).ok_or_else(|| {
                IpamError::Configuration(format!("{ENV_PUSH_DOWN_TAGS}: expected a boolean, got '{value}'"))
            })?;
        }

        if let Some(value) = lookup(ENV_MAX_WRITE_RETRIES) {
            config.max_write_retries = value.trim().parse().map_err(|_| {
                IpamError::Configuration(format!(
                    "{ENV_MAX_WRITE_RETRIES}: expected a non-negative integer, got '{value}'"
                ))
            })?;
        }

        Ok(config)
    }

    pub fn with_equal_prefix_policy(mut self, policy: EqualPrefixPolicy) -> Self {
        self.equal_prefix_policy = policy;
        self
    }

    pub fn with_push_down_tags_on_delete(mut self, enabled: bool) -> Self {
        self.push_down_tags_on_delete = enabled;
        self
    }

    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
