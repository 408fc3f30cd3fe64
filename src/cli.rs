use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deploydag")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Deploy and destroy units in dependency order", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the deployment file
    #[arg(short, long, global = true, env = "DEPLOYDAG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render the dependency graph
    Graph(GraphArgs),

    /// Validate the graph and show execution tiers
    Plan(PlanArgs),

    /// Run each unit's deploy command, dependencies first
    Deploy(RunArgs),

    /// Run each unit's destroy command, dependents first
    Destroy(RunArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// Graphviz dot
    #[default]
    Dot,
    /// JSON steps document
    Json,
}

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: GraphFormat,

    /// Drop edges implied by longer paths
    #[arg(long)]
    pub reduce: bool,

    /// Only include these units and what they require
    #[arg(short, long)]
    pub target: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Only include these units and what they require
    #[arg(short, long)]
    pub target: Vec<String>,

    /// Show teardown order instead
    #[arg(short, long)]
    pub reverse: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Only include these units (plus prerequisites, or dependents on destroy)
    #[arg(short, long)]
    pub target: Vec<String>,

    /// Number of parallel jobs (0 = unbounded, 1 = sequential)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Show what would run without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
