//! Dependency-ordered execution of a graph
//!
//! A [`Walker`] invokes a callback exactly once per node, never before the
//! callbacks of all of that node's dependencies have returned. The overall
//! result is the logical AND of every callback result. A failed node does
//! not stop its dependents from running; skipping them is the callback's
//! decision, typically by inspecting results it recorded earlier.

mod sequential;
mod threaded;

pub use sequential::SequentialWalker;
pub use threaded::ThreadedWalker;

use crate::graph::{Graph, Node};
use crate::limiter::{Bounded, Unbounded};
use crate::types::{Strategy, WalkOptions};

/// Strategy for driving a graph's callbacks in dependency order
pub trait Walker {
    /// Walk the graph, returning `true` if every callback returned `true`
    ///
    /// The graph is expected to be acyclic. Nodes on or behind a cycle are
    /// never invoked and make the walk return `false`.
    fn walk<N, F>(&self, graph: &Graph<N>, callback: F) -> bool
    where
        N: Node + Send + Sync,
        F: Fn(&N) -> bool + Sync;

    /// Walk the graph in teardown order: dependents before dependencies
    fn walk_reverse<N, F>(&self, graph: &Graph<N>, callback: F) -> bool
    where
        N: Node + Send + Sync,
        F: Fn(&N) -> bool + Sync,
    {
        self.walk(&graph.transpose(), callback)
    }
}

/// Walk with the strategy selected by `opts`
///
/// Concurrent strategies get a dedicated pool sized to their limit: `jobs`
/// threads when bounded, one thread per node when unbounded, so every
/// eligible callback can be in flight at once regardless of the CPU count.
pub fn walk_with_options<N, F>(graph: &Graph<N>, opts: &WalkOptions, callback: F) -> bool
where
    N: Node + Send + Sync,
    F: Fn(&N) -> bool + Sync,
{
    log::debug!("Walking {} node(s), {}", graph.len(), opts.strategy());
    match opts.strategy() {
        Strategy::Sequential => SequentialWalker.walk(graph, callback),
        Strategy::Unbounded => ThreadedWalker::sized(Unbounded, graph.len()).walk(graph, callback),
        Strategy::Bounded(jobs) => {
            let threads = jobs.min(graph.len());
            ThreadedWalker::sized(Bounded::new(jobs), threads).walk(graph, callback)
        }
    }
}

/// Readiness table built once before a walk
///
/// Nodes are addressed by their insertion index; the graph itself is never
/// touched while callbacks run.
pub(crate) struct Schedule<'g, N> {
    pub(crate) nodes: Vec<&'g N>,
    pub(crate) pending: Vec<usize>,
    pub(crate) dependents: Vec<Vec<usize>>,
}

impl<'g, N: Node> Schedule<'g, N> {
    pub(crate) fn new(graph: &'g Graph<N>) -> Self {
        let count = graph.len();
        let mut pending = vec![0; count];
        let mut dependents = vec![Vec::new(); count];

        for (idx, deps) in graph.deps.values().enumerate() {
            for dep in deps {
                if let Some(dep_idx) = graph.deps.get_index_of(dep) {
                    pending[idx] += 1;
                    dependents[dep_idx].push(idx);
                }
            }
        }

        Self {
            nodes: graph.deps.keys().collect(),
            pending,
            dependents,
        }
    }

    /// Indices of nodes with nothing left to wait for
    pub(crate) fn ready(&self) -> Vec<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, waiting)| **waiting == 0)
            .map(|(idx, _)| idx)
            .collect()
    }
}
