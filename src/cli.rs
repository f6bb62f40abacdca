//! CLI argument parsing for datastore updates.
//!
//! Running with no subcommand performs the stock refresh from the current
//! directory, matching `pudl-fetch run` with every default.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pudl-fetch",
    version,
    about = "Run the datastore update tool over an ordered fetch plan",
    after_help = "Commands:\n  run     Invoke the update tool once per request (default)\n  plan    Print the invocations without running them\n  init    Write a plan file with the stock requests\n\nExamples:\n  pudl-fetch\n  pudl-fetch run --stop-on-error --report /tmp/fetch-report.json\n  pudl-fetch plan --config fetch.json\n  pudl-fetch init --config fetch.json"
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Plan(PlanArgs),
    Init(InitArgs),
}

/// Run command inputs; flags override the plan file.
#[derive(Parser, Debug, Default)]
#[command(about = "Invoke the update tool once per request, in order")]
pub struct RunArgs {
    /// Plan file (JSON); the stock requests are used when omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the plan's workdir is relative to [default: current dir]
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Override the plan's working directory (relative to --base-dir)
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Override the update tool command line
    #[arg(long, value_name = "CMD")]
    pub tool: Option<String>,

    /// Halt after the first failed invocation
    #[arg(long)]
    pub stop_on_error: bool,

    /// Write a JSON run report
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the invocations a run would make")]
pub struct PlanArgs {
    /// Plan file (JSON); the stock requests are used when omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the plan as JSON instead of command lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a plan file containing the stock requests")]
pub struct InitArgs {
    /// Destination for the plan file
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Overwrite an existing plan file
    #[arg(long)]
    pub force: bool,
}
