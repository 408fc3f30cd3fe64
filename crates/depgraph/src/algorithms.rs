//! Static graph algorithms - validation, ordering, transpose, filter, reduction

use crate::error::{GraphError, Result};
use crate::graph::{Graph, Node};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl<N: Node> Graph<N> {
    /// Check that the dependency relation is acyclic
    ///
    /// Depth-first search with three-colour marking. The returned
    /// [`GraphError::Cycle`] lists the nodes on the cycle and the edge that
    /// closes it.
    pub fn validate(&self) -> Result<(), N> {
        let mut marks: HashMap<&N, Mark> = HashMap::with_capacity(self.len());

        for node in self.nodes() {
            if !marks.contains_key(node) {
                self.visit(node, &mut marks)?;
            }
        }
        Ok(())
    }

    /// Iterative depth-first visit from `root`
    ///
    /// Each stack frame holds a node and the position of the next dependency
    /// to explore, so the frames double as the current path.
    fn visit<'a>(&'a self, root: &'a N, marks: &mut HashMap<&'a N, Mark>) -> Result<(), N> {
        marks.insert(root, Mark::InProgress);
        let mut stack: Vec<(&'a N, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let dep = self.deps.get(node).and_then(|deps| deps.get_index(top.1));
            top.1 += 1;

            let Some(dep) = dep else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };

            match marks.get(dep).copied() {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => {
                    let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                    return Err(GraphError::Cycle {
                        nodes: stack[start..].iter().map(|(n, _)| (*n).clone()).collect(),
                        closing_edge: (node.clone(), dep.clone()),
                    });
                }
                None => {
                    marks.insert(dep, Mark::InProgress);
                    stack.push((dep, 0));
                }
            }
        }
        Ok(())
    }

    /// Order nodes so that every node precedes the nodes it depends on
    ///
    /// Starts from the independent nodes and releases a dependency once all
    /// of its dependents have been emitted. This is the reverse of execution
    /// order and is meant for display.
    pub fn topological_sort(&self) -> Result<Vec<N>, N> {
        let mut in_degree: HashMap<&N, usize> = self.nodes().map(|node| (node, 0)).collect();
        for (_, dep) in self.edges() {
            if let Some(degree) = in_degree.get_mut(dep) {
                *degree += 1;
            }
        }

        let mut ready: VecDeque<&N> = self
            .nodes()
            .filter(|node| in_degree.get(node) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(node) = ready.pop_front() {
            order.push(node.clone());
            for dep in self.direct(node) {
                if let Some(degree) = in_degree.get_mut(dep) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(dep);
                    }
                }
            }
        }

        if order.len() < self.len() {
            self.validate()?;
        }
        Ok(order)
    }

    /// A new graph with every edge reversed
    pub fn transpose(&self) -> Self {
        let mut transposed = Self::new();
        for node in self.nodes() {
            transposed.add_node(node.clone());
        }
        for (node, dep) in self.edges() {
            if let Some(deps) = transposed.deps.get_mut(dep) {
                deps.insert(node.clone());
            }
        }
        transposed
    }

    /// A new graph holding `nodes` plus everything they transitively depend on
    ///
    /// Edges are restricted to the retained nodes, so the result can be
    /// executed on its own without losing prerequisites.
    pub fn filter(&self, nodes: &[N]) -> Result<Self, N> {
        let mut keep: HashSet<&N> = HashSet::new();
        let mut stack: Vec<&N> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let Some((node, _)) = self.deps.get_key_value(node) else {
                return Err(GraphError::NodeNotFound { node: node.clone() });
            };
            stack.push(node);
        }

        while let Some(node) = stack.pop() {
            if keep.insert(node) {
                stack.extend(self.direct(node));
            }
        }

        let mut filtered = Self::new();
        for (node, deps) in &self.deps {
            if keep.contains(node) {
                let retained = deps.iter().filter(|dep| keep.contains(dep)).cloned();
                filtered
                    .deps
                    .insert(node.clone(), retained.collect());
            }
        }
        Ok(filtered)
    }

    /// Remove every edge implied by a longer path, in place
    ///
    /// An edge `u -> v` is dropped when `v` is reachable from some direct
    /// dependency of `u` through at least one edge. Only nodes with two or
    /// more dependencies can carry a redundant edge, and each of those gets
    /// one linear search. Fails without modifying the graph if it contains a
    /// cycle.
    pub fn transitive_reduction(&mut self) -> Result<(), N> {
        self.validate()?;

        let mut redundant: Vec<(N, N)> = Vec::new();
        for (node, deps) in &self.deps {
            if deps.len() < 2 {
                continue;
            }
            let implied = self.reachable_below(deps);
            for dep in deps.iter().filter(|dep| implied.contains(dep)) {
                redundant.push((node.clone(), dep.clone()));
            }
        }

        log::debug!("Transitive reduction removes {} edge(s)", redundant.len());
        for (node, dep) in redundant {
            if let Some(deps) = self.deps.get_mut(&node) {
                deps.shift_remove(&dep);
            }
        }
        Ok(())
    }

    /// Nodes reachable from any of `roots` through one or more edges
    fn reachable_below<'a>(&'a self, roots: &'a IndexSet<N>) -> HashSet<&'a N> {
        let mut seen: HashSet<&N> = HashSet::new();
        let mut stack: Vec<&N> = roots.iter().flat_map(|root| self.direct(root)).collect();
        while let Some(node) = stack.pop() {
            if seen.insert(node) {
                stack.extend(self.direct(node));
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{basic, deps_of};

    fn reachable(graph: &Graph<&'static str>, from: &'static str) -> HashSet<&'static str> {
        let mut seen = HashSet::new();
        let mut stack = graph.dependencies(&from).unwrap();
        while let Some(node) = stack.pop() {
            if seen.insert(node) {
                stack.extend(graph.dependencies(&node).unwrap());
            }
        }
        seen
    }

    #[test]
    fn test_validate_success() {
        assert!(basic().validate().is_ok());
    }

    fn deep_chain(len: usize) -> Graph<usize> {
        Graph::from_map((0..len).map(|i| (i, if i + 1 < len { vec![i + 1] } else { vec![] })))
            .unwrap()
    }

    #[test]
    fn test_validate_deep_chain() {
        let graph = deep_chain(200_000);
        assert_eq!(graph.len(), 200_000);
        assert_eq!(graph.leaves(), vec![199_999]);
    }

    #[test]
    fn test_validate_deep_cycle() {
        let mut graph = deep_chain(100_000);
        graph.add_edge(99_999, 0).unwrap();
        match graph.validate().unwrap_err() {
            GraphError::Cycle {
                nodes,
                closing_edge,
            } => {
                assert_eq!(nodes.len(), 100_000);
                assert_eq!(closing_edge, (99_999, 0));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_transitive_reduction_deep_chain() {
        let mut graph = deep_chain(100_000);
        graph.add_edge(0, 50_000).unwrap();
        graph.add_edge(1, 99_999).unwrap();
        graph.transitive_reduction().unwrap();
        assert_eq!(graph.edge_count(), 99_999);
        assert_eq!(graph.dependencies(&0_usize).unwrap(), vec![1]);
        assert_eq!(graph.dependencies(&1_usize).unwrap(), vec![2]);
    }

    #[test]
    fn test_validate_two_node_cycle() {
        let err = Graph::from_map([("a", vec!["b"]), ("b", vec!["a"])]).unwrap_err();
        match err {
            GraphError::Cycle {
                nodes,
                closing_edge,
            } => {
                assert_eq!(nodes, vec!["a", "b"]);
                assert_eq!(closing_edge, ("b", "a"));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_reports_only_cycle_members() {
        let mut graph = Graph::new();
        for node in ["app", "db", "cache", "net"] {
            graph.add_node(node);
        }
        graph.add_edge("app", "db").unwrap();
        graph.add_edge("db", "cache").unwrap();
        graph.add_edge("cache", "net").unwrap();
        graph.add_edge("net", "db").unwrap();

        match graph.validate() {
            Err(GraphError::Cycle { nodes, closing_edge }) => {
                assert_eq!(nodes, vec!["db", "cache", "net"]);
                assert_eq!(closing_edge, ("net", "db"));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_matches_cycle_presence() {
        let mut graph = basic();
        assert!(graph.validate().is_ok());
        graph.add_edge("d", "a").unwrap();
        assert!(graph.validate().unwrap_err().is_cycle());
        graph.delete_edge(&"d", &"a").unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_topological_sort_chain() {
        let graph = Graph::from_map([("a", vec![]), ("b", vec!["a"]), ("c", vec!["b"])]).unwrap();
        assert_eq!(graph.topological_sort().unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_topological_sort_diamond() {
        let order = basic().topological_sort().unwrap();
        assert_eq!(order.len(), 4);
        let position = |n| order.iter().position(|x| *x == n).unwrap();
        assert!(position("a") < position("b"));
        assert!(position("a") < position("c"));
        assert!(position("b") < position("d"));
        assert!(position("c") < position("d"));
    }

    #[test]
    fn test_topological_sort_rejects_cycle() {
        let mut graph = basic();
        graph.add_edge("d", "a").unwrap();
        assert!(graph.topological_sort().unwrap_err().is_cycle());
    }

    #[test]
    fn test_transpose() {
        let transposed = basic().transpose();
        assert_eq!(deps_of(&transposed, "d"), vec!["b", "c"]);
        assert_eq!(deps_of(&transposed, "c"), vec!["a"]);
        assert_eq!(deps_of(&transposed, "b"), vec!["a"]);
        assert!(deps_of(&transposed, "a").is_empty());
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let graph = Graph::from_map([
            ("a", vec!["b", "c", "d", "e"]),
            ("b", vec!["d"]),
            ("c", vec!["d", "e"]),
            ("d", vec!["e"]),
            ("e", vec![]),
        ])
        .unwrap();
        assert_eq!(graph.transpose().transpose(), graph);
    }

    #[test]
    fn test_transpose_is_independent_copy() {
        let graph = basic();
        let mut transposed = graph.transpose();
        transposed.delete_node(&"d");
        assert_eq!(graph.len(), 4);
        assert_eq!(deps_of(&graph, "b"), vec!["d"]);
    }

    #[test]
    fn test_filter() {
        let filtered = basic().filter(&["b", "c"]).unwrap();
        let expected =
            Graph::from_map([("b", vec!["d"]), ("c", vec!["d"]), ("d", vec![])]).unwrap();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_filter_keeps_transitive_prerequisites() {
        let graph = Graph::from_map([
            ("web", vec!["api"]),
            ("api", vec!["db", "queue"]),
            ("db", vec!["vpc"]),
            ("queue", vec!["vpc"]),
            ("vpc", vec![]),
            ("cdn", vec![]),
        ])
        .unwrap();

        let filtered = graph.filter(&["api"]).unwrap();
        let mut kept: Vec<_> = filtered.nodes().copied().collect();
        kept.sort_unstable();
        assert_eq!(kept, vec!["api", "db", "queue", "vpc"]);
        assert_eq!(filtered.edge_count(), 4);
    }

    #[test]
    fn test_filter_unknown_node() {
        assert_eq!(
            basic().filter(&["zzz"]),
            Err(GraphError::NodeNotFound { node: "zzz" })
        );
    }

    #[test]
    fn test_transitive_reduction_no_reduction() {
        let mut graph = basic();
        graph.transitive_reduction().unwrap();
        assert_eq!(graph, basic());
    }

    #[test]
    fn test_transitive_reduction() {
        let mut graph = Graph::from_map([
            ("a", vec!["b", "c", "d", "e"]),
            ("b", vec!["d"]),
            ("c", vec!["d", "e"]),
            ("d", vec!["e"]),
            ("e", vec![]),
        ])
        .unwrap();
        graph.transitive_reduction().unwrap();

        let expected = Graph::from_map([
            ("a", vec!["b", "c"]),
            ("b", vec!["d"]),
            ("c", vec!["d"]),
            ("d", vec!["e"]),
            ("e", vec![]),
        ])
        .unwrap();
        assert_eq!(graph, expected);
    }

    #[test]
    fn test_transitive_deep_reduction() {
        let mut graph = Graph::from_map([
            ("a", vec!["b", "d"]),
            ("b", vec!["c"]),
            ("c", vec!["d"]),
            ("d", vec![]),
        ])
        .unwrap();
        graph.transitive_reduction().unwrap();

        let expected =
            Graph::from_map([("a", vec!["b"]), ("b", vec!["c"]), ("c", vec!["d"]), ("d", vec![])])
                .unwrap();
        assert_eq!(graph, expected);
    }

    #[test]
    fn test_transitive_reduction_preserves_reachability_minimally() {
        let original = Graph::from_map([
            ("a", vec!["b", "c", "d", "e", "f"]),
            ("b", vec!["c", "e"]),
            ("c", vec!["d", "f"]),
            ("d", vec!["f"]),
            ("e", vec!["f"]),
            ("f", vec![]),
        ])
        .unwrap();
        let mut reduced = original.clone();
        reduced.transitive_reduction().unwrap();

        for node in original.nodes().copied() {
            assert_eq!(reachable(&reduced, node), reachable(&original, node));
        }

        for (from, to) in reduced.edges().map(|(u, v)| (*u, *v)).collect::<Vec<_>>() {
            let mut without = reduced.clone();
            without.delete_edge(&from, &to).unwrap();
            assert_ne!(
                reachable(&without, from),
                reachable(&original, from),
                "edge {from} -> {to} should not be removable"
            );
        }
    }

    #[test]
    fn test_transitive_reduction_rejects_cycle() {
        let mut graph = basic();
        graph.add_edge("d", "a").unwrap();
        let before = graph.clone();
        assert!(graph.transitive_reduction().unwrap_err().is_cycle());
        assert_eq!(graph, before);
    }
}
