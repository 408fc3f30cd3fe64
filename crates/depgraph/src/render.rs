//! Rendering a graph for inspection (Graphviz dot, JSON)

use crate::error::Result;
use crate::graph::{Graph, Node};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Each node with its direct dependencies, in execution order
///
/// Dependencies always appear before the nodes that need them.
pub fn each_step<N: Node>(graph: &Graph<N>) -> Result<Vec<(N, Vec<N>)>, N> {
    let mut order = graph.topological_sort()?;
    order.reverse();

    order
        .into_iter()
        .map(|node| {
            let deps = graph.dependencies(&node)?;
            Ok((node, deps))
        })
        .collect()
}

/// Render the graph in Graphviz "dot" format
pub fn to_dot<N: Node + fmt::Display>(graph: &Graph<N>, name: &str) -> Result<String, N> {
    let mut out = format!("digraph {name} {{\n");
    for (step, deps) in each_step(graph)? {
        for dep in deps {
            out.push_str(&format!("  \"{step}\" -> \"{dep}\";\n"));
        }
    }
    out.push_str("}\n");
    Ok(out)
}

/// Machine-readable description of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsDocument {
    /// Step name -> its dependencies, in execution order
    pub steps: IndexMap<String, StepEntry>,
}

/// Dependencies of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    /// Names of the step's direct dependencies
    pub deps: Vec<String>,
}

impl StepsDocument {
    /// Build the document for a graph
    pub fn from_graph<N: Node + fmt::Display>(graph: &Graph<N>) -> Result<Self, N> {
        let steps = each_step(graph)?
            .into_iter()
            .map(|(step, deps)| {
                let deps = deps.iter().map(ToString::to_string).collect();
                (step.to_string(), StepEntry { deps })
            })
            .collect();
        Ok(Self { steps })
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
