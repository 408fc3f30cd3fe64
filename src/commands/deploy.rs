//! `deploydag deploy` / `deploydag destroy` - run unit commands in order

use anyhow::{Result, bail};

use crate::Context;
use crate::cli::RunArgs;
use crate::engine::{self, Action, ExecuteOptions};
use crate::ui;

pub fn run(ctx: &Context, action: Action, args: &RunArgs) -> Result<()> {
    let (config, graph) = super::load(ctx)?;
    let planned = engine::plan(&graph, &args.target, action)?;

    let mut walk = config.settings.clone();
    if let Some(jobs) = args.jobs {
        walk.jobs = jobs;
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        yes: args.yes,
        walk,
    };
    let summary = engine::execute(&config, &planned, action, &opts)?;

    if summary.aborted {
        return Ok(());
    }
    if !summary.is_success() {
        let problems = summary.failed + summary.skipped;
        ui::error(&format!("{problems} unit(s) did not {action}"));
        bail!("{action} failed");
    }
    Ok(())
}
