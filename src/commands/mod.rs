//! Command implementations

pub mod deploy;
pub mod graph;
pub mod plan;

use anyhow::Result;
use depgraph::Graph;

use crate::Context;
use crate::config::{self, DeployConfig};

/// Load the deployment file selected by the CLI and build its graph
pub fn load(ctx: &Context) -> Result<(DeployConfig, Graph<String>)> {
    let path = config::resolve_path(ctx.config.as_deref());
    let config = DeployConfig::load(&path)?;
    let graph = config.to_graph()?;
    Ok((config, graph))
}
