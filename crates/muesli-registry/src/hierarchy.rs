//! Class hierarchy graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: fully qualified class names
//! - Edges: `Extends` from a class to its parent, `Implements` from a class
//!   to each of its interfaces
//!
//! Nodes are created on first mention, so a class may name a parent that is
//! declared later in the unit.

use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// Edge types in the hierarchy graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyEdge {
    Extends,
    Implements,
}

/// Directed graph of class to supertype relations.
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    graph: DiGraph<String, HierarchyEdge>,
    nodes: FxHashMap<String, NodeIndex>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), index);
        index
    }

    /// Record a class with its parent and interfaces.
    pub fn add_class<'a>(
        &mut self,
        name: &str,
        parent: Option<&str>,
        interfaces: impl IntoIterator<Item = &'a str>,
    ) {
        let from = self.node(name);
        if let Some(parent) = parent {
            let to = self.node(parent);
            self.graph.add_edge(from, to, HierarchyEdge::Extends);
        }
        for interface in interfaces {
            let to = self.node(interface);
            self.graph.add_edge(from, to, HierarchyEdge::Implements);
        }
    }

    /// Whether a value of class `sub` can be used where `sup` is expected.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        match (self.nodes.get(sub), self.nodes.get(sup)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Whether any class is its own ancestor.
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Direct supertypes of `name` with the kind of each relation.
    pub fn supertypes(&self, name: &str) -> Vec<(&str, HierarchyEdge)> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut supertypes: Vec<_> = self
            .graph
            .edges(node)
            .map(|edge| (self.graph[edge.target()].as_str(), *edge.weight()))
            .collect();
        // petgraph walks edges newest first
        supertypes.reverse();
        supertypes
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
