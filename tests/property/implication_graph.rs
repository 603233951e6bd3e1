// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Tag Implication Graphs
//!
//! Schemas whose implications only point "forward" are acyclic and expand
//! to exactly the reachable tags; closing any chain into a loop is rejected.

use std::collections::BTreeSet;

use cim_ipam::domain::{
    validate_acyclic, AddressSpaceId, Prefix, SchemaError, TagDefinition, TagInheritanceValidator,
    TagMap, TagSchema, TagType,
};
use proptest::prelude::*;

const VALUE: &str = "on";

fn tag(i: usize) -> String {
    format!("T{i}")
}

/// Forward edges `i -> j` (i < j) over `n` tags
fn forward_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..8).prop_flat_map(|n| {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let count = pairs.len();
        (
            Just(n),
            proptest::collection::vec(any::<bool>(), count).prop_map(move |keep| {
                pairs
                    .iter()
                    .zip(keep)
                    .filter(|(_, keep)| *keep)
                    .map(|(pair, _)| *pair)
                    .collect::<Vec<_>>()
            }),
        )
    })
}

fn schema_from(n: usize, edges: &[(usize, usize)]) -> TagSchema {
    let space = AddressSpaceId::new();
    let mut schema = TagSchema::new();
    for i in 0..n {
        let definition = edges
            .iter()
            .filter(|(from, _)| *from == i)
            .fold(
                TagDefinition::new(space, tag(i), TagType::Inheritable).unwrap(),
                |definition, (_, to)| definition.with_implication(VALUE, tag(*to), VALUE),
            );
        schema.insert(definition);
    }
    schema
}

fn reachable(start: usize, edges: &[(usize, usize)]) -> BTreeSet<usize> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for (_, to) in edges.iter().filter(|(from, _)| *from == node) {
            if seen.insert(*to) {
                stack.push(*to);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_forward_only_schema_is_acyclic((n, edges) in forward_edges()) {
        let schema = schema_from(n, &edges);
        prop_assert!(validate_acyclic(&schema).is_ok());
    }

    /// Expansion reaches a fixed point holding exactly the reachable tags
    #[test]
    fn prop_expansion_covers_reachable_tags((n, edges) in forward_edges(), start in 0usize..8) {
        prop_assume!(start < n);
        let schema = schema_from(n, &edges);
        let validator = TagInheritanceValidator::new(&schema);

        let direct: TagMap = [(tag(start), VALUE.to_string())].into_iter().collect();
        let prefix: Prefix = "10.0.0.0/8".parse().unwrap();
        let expanded = validator.validate(&prefix, &direct, None).unwrap();

        let expected: BTreeSet<String> = reachable(start, &edges).into_iter().map(tag).collect();
        let actual: BTreeSet<String> = expanded.keys().cloned().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Any chain closed back onto its head is a cycle
    #[test]
    fn prop_closed_chain_is_rejected((n, mut edges) in forward_edges()) {
        for i in 0..n - 1 {
            if !edges.contains(&(i, i + 1)) {
                edges.push((i, i + 1));
            }
        }
        edges.push((n - 1, 0));

        let schema = schema_from(n, &edges);
        let result = validate_acyclic(&schema);
        prop_assert!(matches!(result, Err(SchemaError::CyclicImplication { .. })), "{:?}", result);
    }
}
