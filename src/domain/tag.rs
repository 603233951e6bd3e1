// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tag Definitions
//!
//! Tags are `name -> value` pairs attached to network nodes. A
//! [`TagDefinition`] gives a tag name its schema inside one address space:
//!
//! - [`TagType`] - whether descendants inherit the value
//! - known values - optional closed set of allowed values
//! - attributes - free-form metadata per value
//! - implications - assigning a value forces other tags to given values
//!
//! A tag name with no definition is free-form: any value, not inherited,
//! implies nothing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::domain::network::AddressSpaceId;

/// Tag name -> value
pub type TagMap = BTreeMap<String, String>;

/// Tag schema error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Tag implication from '{tag}' to '{implied}' closes a cycle")]
    CyclicImplication { tag: String, implied: String },

    #[error("Tag definition name cannot be empty")]
    EmptyName,

    #[error("Tag definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("Tag definition '{name}' is still implied by '{referenced_by}'")]
    DefinitionReferenced { name: String, referenced_by: String },
}

/// Whether a tag propagates down the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    #[default]
    Inheritable,
    NonInheritable,
}

/// Schema for one tag name within an address space
///
/// # Examples
///
/// ```rust
/// use cim_ipam::domain::{AddressSpaceId, TagDefinition, TagType};
///
/// let env = TagDefinition::new(AddressSpaceId::new(), "Env", TagType::Inheritable)
///     .unwrap()
///     .with_known_values(["Prod", "Dev"])
///     .with_implication("Prod", "Tier", "Critical");
///
/// assert!(env.is_inheritable());
/// assert_eq!(env.implied_by("Prod"), &[("Tier".to_string(), "Critical".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    pub address_space_id: AddressSpaceId,
    pub name: String,
    pub tag_type: TagType,
    /// Empty means unconstrained
    #[serde(default)]
    pub known_values: BTreeSet<String>,
    /// value -> attribute name -> attribute value
    #[serde(default)]
    pub attributes: BTreeMap<String, BTreeMap<String, String>>,
    /// value -> [(implied tag name, implied value)]
    #[serde(default)]
    pub implications: BTreeMap<String, Vec<(String, String)>>,
}

impl TagDefinition {
    /// Create a definition with no constraints, attributes or implications
    pub fn new(
        address_space_id: AddressSpaceId,
        name: impl Into<String>,
        tag_type: TagType,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        Ok(Self {
            address_space_id,
            name,
            tag_type,
            known_values: BTreeSet::new(),
            attributes: BTreeMap::new(),
            implications: BTreeMap::new(),
        })
    }

    pub fn with_known_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_attribute(
        mut self,
        value: impl Into<String>,
        key: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.attributes
            .entry(value.into())
            .or_default()
            .insert(key.into(), attribute.into());
        self
    }

    /// Assigning `value` to this tag implies `implied_name = implied_value`
    pub fn with_implication(
        mut self,
        value: impl Into<String>,
        implied_name: impl Into<String>,
        implied_value: impl Into<String>,
    ) -> Self {
        self.implications
            .entry(value.into())
            .or_default()
            .push((implied_name.into(), implied_value.into()));
        self
    }

    pub fn is_inheritable(&self) -> bool {
        self.tag_type == TagType::Inheritable
    }

    /// Values are constrained to `known_values`
    pub fn is_constrained(&self) -> bool {
        !self.known_values.is_empty()
    }

    pub fn allows(&self, value: &str) -> bool {
        !self.is_constrained() || self.known_values.contains(value)
    }

    /// Assignments implied by `value`
    pub fn implied_by(&self, value: &str) -> &[(String, String)] {
        self.implications
            .get(value)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every tag name some value of this tag implies
    pub fn implied_tag_names(&self) -> impl Iterator<Item = &str> {
        self.implications
            .values()
            .flatten()
            .map(|(name, _)| name.as_str())
    }

    pub fn attributes_for(&self, value: &str) -> Option<&BTreeMap<String, String>> {
        self.attributes.get(value)
    }
}

/// A single tag value on a node, direct or inherited
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagAssignment {
    pub name: String,
    pub value: String,
    pub is_inherited: bool,
}

impl TagAssignment {
    pub fn direct(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_inherited: false,
        }
    }

    pub fn inherited(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_inherited: true,
        }
    }
}

/// Full set of tag definitions for one address space, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSchema(BTreeMap<String, TagDefinition>);

impl TagSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or replace the definition with the same name
    pub fn insert(&mut self, definition: TagDefinition) -> Option<TagDefinition> {
        self.0.insert(definition.name.clone(), definition)
    }

    pub fn remove(&mut self, name: &str) -> Option<TagDefinition> {
        self.0.remove(name)
    }

    /// Copy of this schema with `definition` inserted or replaced
    pub fn with(&self, definition: TagDefinition) -> Self {
        let mut schema = self.clone();
        schema.insert(definition);
        schema
    }

    /// Undefined tags are not inheritable
    pub fn is_inheritable(&self, name: &str) -> bool {
        self.get(name).is_some_and(TagDefinition::is_inheritable)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TagDefinition> {
        self.0.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TagDefinition> for TagSchema {
    fn from_iter<T: IntoIterator<Item = TagDefinition>>(iter: T) -> Self {
        let mut schema = Self::new();
        for definition in iter {
            schema.insert(definition);
        }
        schema
    }
}
