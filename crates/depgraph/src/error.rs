//! Error types for graph construction and validation.
//!
//! Structural errors are raised synchronously by the mutating and
//! validating operations on [`Graph`](crate::Graph). The graph is always
//! left in a well-defined state so callers can inspect it afterwards.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while building or validating a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<N: fmt::Debug> {
    /// An operation referenced a node that is not in the graph
    #[error("node not found: {node:?}")]
    NodeNotFound {
        /// The missing node
        node: N,
    },

    /// An edge removal referenced an edge that does not exist
    #[error("edge not found: {from:?} -> {to:?}")]
    EdgeNotFound {
        /// Dependent side of the edge
        from: N,
        /// Dependency side of the edge
        to: N,
    },

    /// A node was declared as depending on itself
    #[error("node {node:?} cannot depend on itself")]
    SelfLoop {
        /// The offending node
        node: N,
    },

    /// The dependency relation contains a cycle
    #[error("dependency cycle detected: {} (closed by {})", render_cycle(.nodes), render_edge(.closing_edge))]
    Cycle {
        /// Nodes participating in the cycle, in traversal order
        nodes: Vec<N>,
        /// The edge that closes the cycle
        closing_edge: (N, N),
    },
}

impl<N: fmt::Debug> GraphError<N> {
    /// Whether this error is a cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }
}

fn render_cycle<N: fmt::Debug>(nodes: &[N]) -> String {
    let mut parts: Vec<String> = nodes.iter().map(|n| format!("{n:?}")).collect();
    if let Some(first) = parts.first().cloned() {
        parts.push(first);
    }
    parts.join(" -> ")
}

fn render_edge<N: fmt::Debug>(edge: &(N, N)) -> String {
    format!("{:?} -> {:?}", edge.0, edge.1)
}

/// Result type for graph operations.
pub type Result<T, N> = std::result::Result<T, GraphError<N>>;
