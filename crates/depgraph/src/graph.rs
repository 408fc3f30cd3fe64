//! Dependency graph data structure and structural queries
//!
//! A [`Graph`] maps every node to the set of nodes it directly depends on.
//! An edge `u -> v` means "`u` requires `v` to complete first".

use crate::error::{GraphError, Result};
use indexmap::{IndexMap, IndexSet};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Identity of a node in the graph
///
/// Any cloneable, hashable value can be a node. The engine never looks
/// inside it; identity is whatever the caller's `Eq`/`Hash` say it is.
pub trait Node: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Node for T {}

/// A directed graph of nodes and their direct dependencies
///
/// Iteration order of every query follows first-insertion order, so the
/// same sequence of mutations always produces the same output.
#[derive(Clone)]
pub struct Graph<N: Node> {
    pub(crate) deps: IndexMap<N, IndexSet<N>>,
}

impl<N: Node> Graph<N> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            deps: IndexMap::new(),
        }
    }

    /// Build a graph from a mapping of node -> dependencies
    ///
    /// See [`Graph::load`] for the exact semantics.
    pub fn from_map<I, D>(spec: I) -> Result<Self, N>
    where
        I: IntoIterator<Item = (N, D)>,
        D: IntoIterator<Item = N>,
    {
        let mut graph = Self::new();
        graph.load(spec)?;
        Ok(graph)
    }

    /// Replace the contents of this graph with the given mapping
    ///
    /// Every key becomes a node, then every listed dependency becomes an
    /// edge (dependencies that are not keys are added as nodes). The result
    /// is validated; on error the graph stays populated so it can be
    /// inspected, but it must be treated as invalid.
    pub fn load<I, D>(&mut self, spec: I) -> Result<(), N>
    where
        I: IntoIterator<Item = (N, D)>,
        D: IntoIterator<Item = N>,
    {
        self.reset();

        let entries: Vec<(N, D)> = spec.into_iter().collect();
        for (node, _) in &entries {
            self.add_node(node.clone());
        }

        for (node, deps) in entries {
            for dep in deps {
                self.add_node(dep.clone());
                self.add_edge(node.clone(), dep)?;
            }
        }

        self.validate()
    }

    /// Add a node with no dependencies; no-op if it already exists
    pub fn add_node(&mut self, node: N) {
        self.deps.entry(node).or_default();
    }

    /// Record that `from` depends on `to`
    ///
    /// Both nodes must already exist. Cycles are not checked here; call
    /// [`Graph::validate`] once the graph is built.
    pub fn add_edge(&mut self, from: N, to: N) -> Result<(), N> {
        if !self.deps.contains_key(&to) {
            return Err(GraphError::NodeNotFound { node: to });
        }
        if from == to {
            return Err(GraphError::SelfLoop { node: from });
        }
        match self.deps.get_mut(&from) {
            Some(deps) => {
                deps.insert(to);
                Ok(())
            }
            None => Err(GraphError::NodeNotFound { node: from }),
        }
    }

    /// Remove the edge `from -> to`
    pub fn delete_edge(&mut self, from: &N, to: &N) -> Result<(), N> {
        let deps = self
            .deps
            .get_mut(from)
            .ok_or_else(|| GraphError::NodeNotFound { node: from.clone() })?;

        if deps.shift_remove(to) {
            Ok(())
        } else {
            Err(GraphError::EdgeNotFound {
                from: from.clone(),
                to: to.clone(),
            })
        }
    }

    /// Remove a node and every edge pointing at it; no-op if absent
    pub fn delete_node(&mut self, node: &N) {
        if self.deps.shift_remove(node).is_none() {
            return;
        }
        for deps in self.deps.values_mut() {
            deps.shift_remove(node);
        }
    }

    /// Rename a node, rewriting every edge that references it
    ///
    /// If `new` already exists, the dependency sets are merged.
    pub fn rename_node(&mut self, old: &N, new: N) -> Result<(), N> {
        let Some(old_deps) = self.deps.get(old) else {
            return Err(GraphError::NodeNotFound { node: old.clone() });
        };
        if old_deps.contains(&new) {
            return Err(GraphError::SelfLoop { node: new });
        }
        if self.deps.get(&new).is_some_and(|deps| deps.contains(old)) {
            return Err(GraphError::SelfLoop { node: new });
        }

        let mut renamed: IndexMap<N, IndexSet<N>> = IndexMap::with_capacity(self.deps.len());
        for (node, deps) in self.deps.drain(..) {
            let key = if node == *old { new.clone() } else { node };
            let deps = deps
                .into_iter()
                .map(|dep| if dep == *old { new.clone() } else { dep });
            renamed.entry(key).or_default().extend(deps);
        }
        self.deps = renamed;
        Ok(())
    }

    /// Remove every node and edge
    pub fn reset(&mut self) {
        self.deps.clear();
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.deps.values().map(IndexSet::len).sum()
    }

    /// Whether the node exists
    pub fn contains(&self, node: &N) -> bool {
        self.deps.contains_key(node)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.deps.keys()
    }

    /// All edges as `(dependent, dependency)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> {
        self.deps
            .iter()
            .flat_map(|(node, deps)| deps.iter().map(move |dep| (node, dep)))
    }

    /// Nodes that nothing else depends on
    pub fn independent_nodes(&self) -> Vec<N> {
        let depended_on: HashSet<&N> = self.deps.values().flatten().collect();
        self.deps
            .keys()
            .filter(|node| !depended_on.contains(node))
            .cloned()
            .collect()
    }

    /// Nodes with no dependencies, eligible to run immediately
    pub fn leaves(&self) -> Vec<N> {
        self.deps
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(node, _)| node.clone())
            .collect()
    }

    /// Direct dependencies of a node
    ///
    /// Accepts any borrowed form of the node, e.g. `&str` for `Graph<String>`.
    pub fn dependencies<Q>(&self, node: &Q) -> Result<Vec<N>, N>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = N> + ?Sized,
    {
        self.deps
            .get(node)
            .map(|deps| deps.iter().cloned().collect())
            .ok_or_else(|| GraphError::NodeNotFound {
                node: node.to_owned(),
            })
    }

    /// Nodes that list `node` as a direct dependency
    pub fn dependents(&self, node: &N) -> Result<Vec<N>, N> {
        if !self.deps.contains_key(node) {
            return Err(GraphError::NodeNotFound { node: node.clone() });
        }
        Ok(self
            .deps
            .iter()
            .filter(|(_, deps)| deps.contains(node))
            .map(|(dependent, _)| dependent.clone())
            .collect())
    }

    pub(crate) fn direct(&self, node: &N) -> impl Iterator<Item = &N> {
        self.deps.get(node).into_iter().flatten()
    }
}

impl<N: Node + Ord> Graph<N> {
    /// Every node reachable through dependencies, excluding `node` itself
    ///
    /// Sorted by node identity so repeated calls are comparable.
    pub fn all_dependencies(&self, node: &N) -> Result<Vec<N>, N> {
        if !self.deps.contains_key(node) {
            return Err(GraphError::NodeNotFound { node: node.clone() });
        }

        let mut seen: HashSet<&N> = HashSet::new();
        let mut stack: Vec<&N> = self.direct(node).collect();
        while let Some(current) = stack.pop() {
            if current == node || !seen.insert(current) {
                continue;
            }
            stack.extend(self.direct(current));
        }

        let mut all: Vec<N> = seen.into_iter().cloned().collect();
        all.sort();
        Ok(all)
    }
}

impl<N: Node> Default for Graph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> PartialEq for Graph<N> {
    fn eq(&self, other: &Self) -> bool {
        self.deps == other.deps
    }
}

impl<N: Node> Eq for Graph<N> {}

impl<N: Node> fmt::Debug for Graph<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.deps.iter()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `{a: [b, c], b: [d], c: [d], d: []}`
    pub(crate) fn basic() -> Graph<&'static str> {
        Graph::from_map([
            ("a", vec!["b", "c"]),
            ("b", vec!["d"]),
            ("c", vec!["d"]),
            ("d", vec![]),
        ])
        .unwrap()
    }

    pub(crate) fn deps_of(graph: &Graph<&'static str>, node: &'static str) -> Vec<&'static str> {
        let mut deps = graph.dependencies(&node).unwrap();
        deps.sort_unstable();
        deps
    }

    #[test]
    fn test_add_node() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.add_node("a");
        assert_eq!(graph.len(), 1);
        assert!(graph.dependencies(&"a").unwrap().is_empty());
    }

    #[test]
    fn test_add_edge() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_edge("a", "b").unwrap();
        assert_eq!(deps_of(&graph, "a"), vec!["b"]);
        assert!(deps_of(&graph, "b").is_empty());
    }

    #[test]
    fn test_add_edge_missing_node() {
        let mut graph = Graph::new();
        graph.add_node("a");
        assert_eq!(
            graph.add_edge("a", "b"),
            Err(GraphError::NodeNotFound { node: "b" })
        );
        assert_eq!(
            graph.add_edge("z", "a"),
            Err(GraphError::NodeNotFound { node: "z" })
        );
    }

    #[test]
    fn test_dependencies_by_borrowed_key() {
        let graph: Graph<String> =
            Graph::from_map([("app".to_string(), vec!["db".to_string()])]).unwrap();
        assert_eq!(graph.dependencies("app").unwrap(), vec!["db".to_string()]);
        assert_eq!(
            graph.dependencies("ghost"),
            Err(GraphError::NodeNotFound {
                node: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_add_edge_rejects_self_loop() {
        let mut graph = Graph::new();
        graph.add_node("a");
        assert_eq!(
            graph.add_edge("a", "a"),
            Err(GraphError::SelfLoop { node: "a" })
        );
    }

    #[test]
    fn test_from_map() {
        let graph = basic();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(deps_of(&graph, "a"), vec!["b", "c"]);
        assert_eq!(deps_of(&graph, "b"), vec!["d"]);
        assert_eq!(deps_of(&graph, "c"), vec!["d"]);
        assert!(deps_of(&graph, "d").is_empty());
    }

    #[test]
    fn test_load_adds_undeclared_dependencies() {
        let graph = Graph::from_map([("app", vec!["db"])]).unwrap();
        assert!(graph.contains(&"db"));
        assert_eq!(graph.leaves(), vec!["db"]);
    }

    #[test]
    fn test_load_replaces_existing_state() {
        let mut graph = basic();
        graph.load([("x", Vec::new())]).unwrap();
        assert_eq!(graph.nodes().copied().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_load_cycle_leaves_graph_populated() {
        let mut graph = Graph::new();
        let err = graph.load([("a", vec!["b"]), ("b", vec!["a"])]).unwrap_err();
        assert!(err.is_cycle());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_reset() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.reset();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_delete_node() {
        let mut graph = basic();
        graph.delete_node(&"d");
        assert_eq!(graph.len(), 3);
        assert!(deps_of(&graph, "b").is_empty());
        assert!(deps_of(&graph, "c").is_empty());

        graph.delete_node(&"missing");
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_size_after_delete() {
        let mut graph = basic();
        assert_eq!(graph.len(), 4);
        graph.delete_node(&"a");
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_delete_edge() {
        let mut graph = basic();
        graph.delete_edge(&"a", &"b").unwrap();
        assert_eq!(deps_of(&graph, "a"), vec!["c"]);
        assert_eq!(
            graph.delete_edge(&"a", &"b"),
            Err(GraphError::EdgeNotFound { from: "a", to: "b" })
        );
        assert_eq!(
            graph.delete_edge(&"z", &"b"),
            Err(GraphError::NodeNotFound { node: "z" })
        );
    }

    #[test]
    fn test_rename_node() {
        let mut graph = basic();
        graph.rename_node(&"d", "network").unwrap();
        assert!(!graph.contains(&"d"));
        assert_eq!(deps_of(&graph, "b"), vec!["network"]);
        assert_eq!(deps_of(&graph, "c"), vec!["network"]);
        assert_eq!(graph.leaves(), vec!["network"]);
    }

    #[test]
    fn test_rename_node_into_self_loop() {
        let mut graph = basic();
        assert_eq!(
            graph.rename_node(&"b", "d"),
            Err(GraphError::SelfLoop { node: "d" })
        );
        assert_eq!(graph, basic());
    }

    #[test]
    fn test_independent_nodes() {
        assert_eq!(basic().independent_nodes(), vec!["a"]);
    }

    #[test]
    fn test_leaves() {
        assert_eq!(basic().leaves(), vec!["d"]);
    }

    #[test]
    fn test_dependencies() {
        assert_eq!(deps_of(&basic(), "a"), vec!["b", "c"]);
        assert_eq!(
            basic().dependencies(&"z"),
            Err(GraphError::NodeNotFound { node: "z" })
        );
    }

    #[test]
    fn test_dependents() {
        let graph = basic();
        let sorted = |node| {
            let mut found = graph.dependents(&node).unwrap();
            found.sort_unstable();
            found
        };
        assert!(sorted("a").is_empty());
        assert_eq!(sorted("b"), vec!["a"]);
        assert_eq!(sorted("c"), vec!["a"]);
        assert_eq!(sorted("d"), vec!["b", "c"]);
    }

    #[test]
    fn test_all_dependencies() {
        let graph = basic();
        assert_eq!(graph.all_dependencies(&"a").unwrap(), vec!["b", "c", "d"]);
        assert_eq!(graph.all_dependencies(&"b").unwrap(), vec!["d"]);
        assert!(graph.all_dependencies(&"d").unwrap().is_empty());
    }

    #[test]
    fn test_all_dependencies_disjoint_roots() {
        let graph =
            Graph::from_map([("a", vec!["c"]), ("b", vec!["d"]), ("c", vec!["d"]), ("d", vec![])])
                .unwrap();
        assert_eq!(graph.all_dependencies(&"a").unwrap(), vec!["c", "d"]);
        assert_eq!(graph.all_dependencies(&"b").unwrap(), vec!["d"]);
        assert!(graph.all_dependencies(&"d").unwrap().is_empty());
    }

    #[test]
    fn test_edges() {
        let edges: Vec<_> = basic().edges().map(|(u, v)| (*u, *v)).collect();
        assert_eq!(edges, vec![("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let reordered = Graph::from_map([
            ("d", vec![]),
            ("c", vec!["d"]),
            ("b", vec!["d"]),
            ("a", vec!["c", "b"]),
        ])
        .unwrap();
        assert_eq!(reordered, basic());
    }
}
