//! Execution planner - narrows the unit graph to what a command must touch

use anyhow::Result;
use depgraph::Graph;
use std::collections::HashMap;
use std::fmt;

use crate::config::Unit;

/// What a walk does to each unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Destroy,
}

impl Action {
    /// The unit's command for this action, if it has one
    pub fn command(self, unit: &Unit) -> Option<&str> {
        match self {
            Self::Deploy => unit.deploy.as_deref(),
            Self::Destroy => unit.destroy.as_deref(),
        }
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Destroy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => write!(f, "deploy"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Build the graph a walk runs forward
///
/// For deploy this is the unit graph narrowed to `targets` and everything
/// they require. For destroy the graph is transposed first, so narrowing keeps
/// every unit that depends on a target and a forward walk tears dependents
/// down before what they rely on. An empty target list keeps every unit.
pub fn plan(graph: &Graph<String>, targets: &[String], action: Action) -> Result<Graph<String>> {
    let oriented = if action.is_reverse() {
        graph.transpose()
    } else {
        graph.clone()
    };

    if targets.is_empty() {
        return Ok(oriented);
    }

    let narrowed = oriented.filter(targets)?;
    log::info!(
        "Narrowed {} unit(s) to {} for {}",
        graph.len(),
        narrowed.len(),
        action
    );
    Ok(narrowed)
}

/// Group units into tiers: every unit's prerequisites sit in earlier tiers
///
/// Units in the same tier may run concurrently.
pub fn tiers(graph: &Graph<String>) -> Result<Vec<Vec<String>>> {
    let mut level: HashMap<String, usize> = HashMap::with_capacity(graph.len());
    let mut tiers: Vec<Vec<String>> = Vec::new();

    for (unit, deps) in depgraph::each_step(graph)? {
        let tier = deps
            .iter()
            .filter_map(|dep| level.get(dep))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        if tiers.len() <= tier {
            tiers.resize_with(tier + 1, Vec::new);
        }
        tiers[tier].push(unit.clone());
        level.insert(unit, tier);
    }

    for tier in &mut tiers {
        tier.sort();
    }
    Ok(tiers)
}
