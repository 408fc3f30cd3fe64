//! `deploydag plan` - validate and show execution tiers

use anyhow::Result;

use crate::Context;
use crate::cli::PlanArgs;
use crate::engine::{Action, plan, tiers};
use crate::ui;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let (config, graph) = super::load(ctx)?;
    let action = if args.reverse {
        Action::Destroy
    } else {
        Action::Deploy
    };
    let planned = plan(&graph, &args.target, action)?;
    let tiers = tiers(&planned)?;

    if !ctx.quiet {
        ui::header(&format!("{} plan", capitalize(&action.to_string())));
        ui::field("units", planned.len());
        ui::field("edges", planned.edge_count());
        ui::field("concurrency", config.settings.strategy());
        println!();
    }

    for (i, tier) in tiers.iter().enumerate() {
        ui::tier(i + 1, tiers.len(), tier);
    }

    if !ctx.quiet {
        ui::outcome(true, "Graph is acyclic");
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
