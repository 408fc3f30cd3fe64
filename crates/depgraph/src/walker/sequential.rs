//! Single-threaded reference walker

use super::{Schedule, Walker};
use crate::graph::{Graph, Node};

/// Runs callbacks one at a time on the caller's thread
///
/// Processes the graph tier by tier: every node whose dependencies have all
/// been processed runs, then the next tier is computed from what they
/// released. Order within a tier is unspecified.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialWalker;

impl SequentialWalker {
    /// Walk with a callback that may mutate its captured state
    pub fn walk_mut<N, F>(&self, graph: &Graph<N>, mut callback: F) -> bool
    where
        N: Node,
        F: FnMut(&N) -> bool,
    {
        let mut schedule = Schedule::new(graph);
        let mut tier = schedule.ready();
        let mut visited = 0;
        let mut ok = true;

        while !tier.is_empty() {
            let mut next = Vec::new();
            for idx in tier {
                let node = schedule.nodes[idx];
                log::debug!("Running {node:?}");
                if !callback(node) {
                    log::warn!("{node:?} failed");
                    ok = false;
                }
                visited += 1;

                for &dependent in &schedule.dependents[idx] {
                    schedule.pending[dependent] -= 1;
                    if schedule.pending[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            tier = next;
        }

        if visited < schedule.nodes.len() {
            log::error!(
                "Walk stalled: {} node(s) are on or behind a dependency cycle",
                schedule.nodes.len() - visited
            );
            return false;
        }
        ok
    }
}

impl Walker for SequentialWalker {
    fn walk<N, F>(&self, graph: &Graph<N>, callback: F) -> bool
    where
        N: Node + Send + Sync,
        F: Fn(&N) -> bool + Sync,
    {
        self.walk_mut(graph, callback)
    }
}
