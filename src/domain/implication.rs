// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tag Implication Graph
//!
//! Implications form a directed graph over tag names: an edge `A -> B`
//! exists when some value of `A` implies a value of `B`. The graph must
//! stay acyclic so that implication expansion always terminates.
//!
//! Tag names are interned to dense `usize` ids and edges are stored as
//! adjacency lists over those ids; traversal never chases references
//! between definitions.

use std::collections::HashMap;

use crate::domain::invariants::ValidationError;
use crate::domain::tag::{SchemaError, TagAssignment, TagDefinition, TagMap, TagSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Directed graph of tag-name implications for one schema
#[derive(Debug, Clone, Default)]
pub struct ImplicationGraph {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl ImplicationGraph {
    /// Build the graph from every definition in `schema`
    ///
    /// Implication targets without a definition of their own are still
    /// graph nodes.
    pub fn build(schema: &TagSchema) -> Self {
        let mut graph = Self::default();

        for definition in schema.definitions() {
            let from = graph.intern(&definition.name);
            for implied in definition.implied_tag_names() {
                let to = graph.intern(implied);
                graph.edges[from].push(to);
            }
        }

        for targets in &mut graph.edges {
            targets.sort_unstable();
            targets.dedup();
        }

        graph
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        self.edges.push(Vec::new());
        id
    }

    /// Number of tag names in the graph
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Tag names directly implied by `name`
    pub fn successors(&self, name: &str) -> Vec<&str> {
        self.ids
            .get(name)
            .map(|&id| {
                self.edges[id]
                    .iter()
                    .map(|&to| self.names[to].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First edge found that closes a cycle, as `(tag, implied)`
    ///
    /// Iterative three-colour depth-first search. An edge into an
    /// in-progress node is a back edge, i.e. a cycle.
    pub fn find_cycle(&self) -> Option<(&str, &str)> {
        let mut marks = vec![Mark::Unvisited; self.names.len()];

        for root in 0..self.names.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }

            // (node, index of the next edge to follow)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::InProgress;

            while let Some(&(node, cursor)) = stack.last() {
                match self.edges[node].get(cursor) {
                    Some(&next) => {
                        let top = stack.len() - 1;
                        stack[top].1 += 1;

                        match marks[next] {
                            Mark::InProgress => {
                                return Some((&self.names[node], &self.names[next]));
                            }
                            Mark::Unvisited => {
                                marks[next] = Mark::InProgress;
                                stack.push((next, 0));
                            }
                            Mark::Done => {}
                        }
                    }
                    None => {
                        marks[node] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }

        None
    }
}

/// Reject a schema whose implications form a cycle
///
/// Must run over the whole schema on every definition change: a single new
/// implication can close a cycle spanning several tags.
pub fn validate_acyclic(schema: &TagSchema) -> Result<(), SchemaError> {
    match ImplicationGraph::build(schema).find_cycle() {
        Some((tag, implied)) => Err(SchemaError::CyclicImplication {
            tag: tag.to_string(),
            implied: implied.to_string(),
        }),
        None => Ok(()),
    }
}

/// One implication expansion step for `assignment`
///
/// Returns the new assignments that `assignment` implies and `existing`
/// does not already hold. An implied name already present with the same
/// value is skipped; with a different value it is an `ImplicationConflict`.
/// Callers iterate to a fixed point.
pub fn expand_implications(
    schema: &TagSchema,
    assignment: &TagAssignment,
    existing: &TagMap,
) -> Result<Vec<TagAssignment>, ValidationError> {
    let Some(definition) = schema.get(&assignment.name) else {
        return Ok(Vec::new());
    };

    let mut implied: Vec<TagAssignment> = Vec::new();
    for (name, value) in definition.implied_by(&assignment.value) {
        let current = existing
            .get(name)
            .or_else(|| implied.iter().find(|a| &a.name == name).map(|a| &a.value));

        match current {
            Some(current) if current == value => {}
            Some(current) => {
                return Err(ValidationError::ImplicationConflict {
                    tag: name.clone(),
                    existing: current.clone(),
                    implied: value.clone(),
                    implied_by: format!("{}={}", assignment.name, assignment.value),
                });
            }
            None => implied.push(TagAssignment::direct(name.clone(), value.clone())),
        }
    }

    Ok(implied)
}

/// Fail if `definition` constrains its values and `value` is not among them
pub fn validate_known_value(definition: &TagDefinition, value: &str) -> Result<(), ValidationError> {
    if !definition.allows(value) {
        return Err(ValidationError::UnknownTagValue {
            tag: definition.name.clone(),
            value: value.to_string(),
        });
    }
    Ok(())
}
