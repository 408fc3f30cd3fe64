//! Execution engine - walks the planned graph running unit commands

use anyhow::Result;
use colored::Colorize;
use depgraph::{Graph, WalkOptions, walk_with_options};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::planner::Action;
use crate::config::DeployConfig;
use crate::runner;
use crate::ui;

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't run anything, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Scheduling of the walk
    pub walk: WalkOptions,
}

/// Outcome of a single unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Command ran and exited successfully
    Succeeded,
    /// Unit has no command for this action
    NoChange,
    /// Command could not be started or exited non-zero
    Failed { error: String },
    /// A prerequisite did not complete, so the command never ran
    Skipped { reason: String },
}

impl UnitStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Succeeded | Self::NoChange)
    }

    fn symbol(&self) -> colored::ColoredString {
        match self {
            Self::Succeeded => "✓".green(),
            Self::NoChange => "○".dimmed(),
            Self::Failed { .. } => "✗".red(),
            Self::Skipped { .. } => "⊘".yellow(),
        }
    }
}

/// Summary of execution results
#[derive(Debug, Default)]
pub struct ExecuteSummary {
    pub succeeded: usize,
    pub no_change: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The walk reached every unit
    pub completed: bool,
    /// The user declined to proceed
    pub aborted: bool,
}

impl ExecuteSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.no_change + self.skipped + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.completed && self.failed == 0 && self.skipped == 0
    }
}

/// Run `action` for every unit of `graph` in dependency order
///
/// `graph` is already oriented for the action (see `planner::plan`), so it is
/// always walked forward. A unit whose prerequisite failed or was skipped is
/// itself skipped.
pub fn execute(
    config: &DeployConfig,
    graph: &Graph<String>,
    action: Action,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    if graph.is_empty() {
        ui::info("Nothing to do");
        return Ok(ExecuteSummary {
            completed: true,
            ..Default::default()
        });
    }

    // 1. Display what will run
    display_plan(config, graph, action)?;

    // 2. Confirm (unless --yes)
    if !opts.yes && !opts.dry_run && !confirm_proceed()? {
        println!();
        ui::warn("Aborted");
        return Ok(ExecuteSummary {
            skipped: graph.len(),
            aborted: true,
            ..Default::default()
        });
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - nothing executed", "ℹ".blue());
        return Ok(ExecuteSummary {
            completed: true,
            ..Default::default()
        });
    }

    // 3. Walk
    println!();
    println!(
        "  {} Running {} {} unit(s) ({})...",
        "→".cyan(),
        action,
        graph.len(),
        opts.walk.strategy()
    );

    let statuses: Mutex<HashMap<String, UnitStatus>> = Mutex::new(HashMap::new());
    let all_ok = walk_with_options(graph, &opts.walk, |name| {
        let status = match blocked_by(graph, &statuses, name) {
            Some(dep) => UnitStatus::Skipped {
                reason: format!("{dep} did not complete"),
            },
            None => run_unit(config, action, name),
        };
        report(name, &status);
        let ok = status.is_ok();
        record_status(&statuses, name.clone(), status);
        ok
    });

    // 4. Summary
    log::debug!("Walk finished, all units ok: {all_ok}");
    let mut summary = summarize(&into_statuses(statuses));
    summary.completed = summary.total() == graph.len();
    print_summary(action, &summary);

    Ok(summary)
}

/// First prerequisite of `name` that did not complete
fn blocked_by(
    graph: &Graph<String>,
    statuses: &Mutex<HashMap<String, UnitStatus>>,
    name: &str,
) -> Option<String> {
    let deps = graph.dependencies(name).unwrap_or_default();
    let statuses = statuses.lock().unwrap_or_else(PoisonError::into_inner);
    deps.into_iter()
        .find(|dep| statuses.get(dep).is_none_or(|status| !status.is_ok()))
}

fn run_unit(config: &DeployConfig, action: Action, name: &str) -> UnitStatus {
    let Some(unit) = config.find_unit(name) else {
        return UnitStatus::Failed {
            error: "unit is not defined".to_string(),
        };
    };
    let Some(command) = action.command(unit) else {
        log::debug!("{name} has no {action} command");
        return UnitStatus::NoChange;
    };

    log::info!("{action} {name}: {command}");
    match runner::run_shell(command) {
        Ok(status) if status.success() => UnitStatus::Succeeded,
        Ok(status) => UnitStatus::Failed {
            error: format!("command {status}"),
        },
        Err(e) => UnitStatus::Failed {
            error: format!("{e:#}"),
        },
    }
}

fn report(name: &str, status: &UnitStatus) {
    let note = match status {
        UnitStatus::Failed { error } => Some(error.red()),
        UnitStatus::Skipped { reason } => Some(reason.dimmed()),
        UnitStatus::Succeeded | UnitStatus::NoChange => None,
    };
    ui::unit_result(status.symbol(), name, note);
}

fn record_status(
    statuses: &Mutex<HashMap<String, UnitStatus>>,
    name: String,
    status: UnitStatus,
) {
    match statuses.lock() {
        Ok(mut locked) => locked.insert(name, status),
        Err(poisoned) => poisoned.into_inner().insert(name, status),
    };
}

fn into_statuses(statuses: Mutex<HashMap<String, UnitStatus>>) -> HashMap<String, UnitStatus> {
    match statuses.into_inner() {
        Ok(collected) => collected,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn summarize(statuses: &HashMap<String, UnitStatus>) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    for status in statuses.values() {
        match status {
            UnitStatus::Succeeded => summary.succeeded += 1,
            UnitStatus::NoChange => summary.no_change += 1,
            UnitStatus::Failed { .. } => summary.failed += 1,
            UnitStatus::Skipped { .. } => summary.skipped += 1,
        }
    }
    summary
}

/// Show each unit with its command, in execution order
fn display_plan(config: &DeployConfig, graph: &Graph<String>, action: Action) -> Result<()> {
    println!();
    println!("{}", format!("Units to {action}").cyan().bold());
    for (name, deps) in depgraph::each_step(graph)? {
        let command = config
            .find_unit(&name)
            .and_then(|unit| action.command(unit));
        ui::planned_unit(&name, &deps, command);
    }
    Ok(())
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(action: Action, summary: &ExecuteSummary) {
    if summary.is_success() {
        ui::outcome(true, &format!("{action} finished successfully!"));
    } else {
        ui::outcome(false, &format!("{action} finished with errors"));
    }

    ui::count(summary.succeeded, "units succeeded");
    ui::count(summary.no_change, "units had nothing to run");
    ui::count(summary.skipped, "units skipped");
    ui::count(summary.failed, &"units failed".red().to_string());
}
