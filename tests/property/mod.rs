// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `prefix_algebra`: parsing, containment and subnet partitioning
//! - `implication_graph`: cycle detection over generated schemas

mod implication_graph;
mod prefix_algebra;
