//! `deploydag graph` - render the unit graph

use anyhow::{Context as AnyhowContext, Result};
use depgraph::StepsDocument;

use crate::Context;
use crate::cli::{GraphArgs, GraphFormat};
use crate::engine::{Action, plan};

pub fn run(ctx: &Context, args: &GraphArgs) -> Result<()> {
    let (_, graph) = super::load(ctx)?;
    let mut graph = plan(&graph, &args.target, Action::Deploy)?;

    if args.reduce {
        let before = graph.edge_count();
        graph.transitive_reduction()?;
        log::info!(
            "Transitive reduction dropped {} edge(s)",
            before - graph.edge_count()
        );
    }

    let rendered = match args.format {
        GraphFormat::Dot => depgraph::to_dot(&graph, "deploydag")?,
        GraphFormat::Json => StepsDocument::from_graph(&graph)?
            .to_json_pretty()
            .context("Failed to serialize graph")?,
    };
    print!("{rendered}");
    if args.format == GraphFormat::Json {
        println!();
    }
    Ok(())
}
