//! # depgraph
//!
//! Dependency graph engine for deciding in what order, and how much in
//! parallel, deployable units may run.
//!
//! ## Core Concepts
//!
//! - **Graph**: nodes and their direct dependencies (`u -> v` means `u`
//!   needs `v` first), with structural queries and static algorithms
//!   (validation, topological sort, transpose, filter, transitive reduction)
//! - **Walker**: drives a per-node callback in dependency order, either
//!   sequentially or concurrently under a [`Limiter`]
//! - **Render**: Graphviz and JSON views of a graph for inspection
//!
//! The engine does not know what a node represents and never retries or
//! prunes on failure; that policy belongs to the callback.
//!
//! ## Example
//!
//! ```
//! use depgraph::{Bounded, Graph, ThreadedWalker, Walker};
//!
//! let graph = Graph::from_map([
//!     ("app", vec!["db", "cache"]),
//!     ("db", vec!["network"]),
//!     ("cache", vec!["network"]),
//!     ("network", vec![]),
//! ])
//! .expect("acyclic");
//!
//! assert_eq!(graph.leaves(), vec!["network"]);
//!
//! let walker = ThreadedWalker::new(Bounded::new(2));
//! let ok = walker.walk(&graph, |unit| {
//!     println!("deploying {unit}");
//!     true
//! });
//! assert!(ok);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod algorithms;
pub mod error;
pub mod graph;
pub mod limiter;
pub mod render;
pub mod types;
pub mod walker;

// Re-export main types at crate root
pub use error::{GraphError, Result};
pub use graph::{Graph, Node};
pub use limiter::{Bounded, Limiter, Permit, Unbounded};
pub use render::{StepEntry, StepsDocument, each_step, to_dot};
pub use types::{Strategy, WalkOptions};
pub use walker::{SequentialWalker, ThreadedWalker, Walker, walk_with_options};
