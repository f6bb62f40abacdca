use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

mod cli;
mod config;
mod logging;
mod request;
mod sequencer;
mod tool;
mod util;

use cli::{Command, InitArgs, PlanArgs, RootArgs, RunArgs};
use config::FetchPlan;
use sequencer::ProcessInvoker;

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();

    match args.command {
        Some(Command::Run(args)) => cmd_run(args),
        Some(Command::Plan(args)) => cmd_plan(args).map(|()| ExitCode::SUCCESS),
        Some(Command::Init(args)) => cmd_init(args).map(|()| ExitCode::SUCCESS),
        None => cmd_run(RunArgs::default()),
    }
}

fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    logging::init_tracing(args.verbose)?;

    let mut plan = load_or_default(args.config.as_deref())?;
    if let Some(workdir) = args.workdir {
        plan.workdir = workdir;
    }
    if let Some(tool) = args.tool {
        plan.tool = tool;
    }
    plan.stop_on_error |= args.stop_on_error;

    let base_dir = match args.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let prepared = sequencer::prepare(&plan, &base_dir)?;
    let report = sequencer::run(&prepared, &mut ProcessInvoker)?;

    if let Some(path) = &args.report {
        match util::write_json(path, &report) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote run report"),
            Err(err) => tracing::error!(path = %path.display(), "write run report: {err:#}"),
        }
    }

    let code = u8::try_from(report.exit_code()).unwrap_or(1);
    Ok(ExitCode::from(code))
}

fn cmd_plan(args: PlanArgs) -> Result<()> {
    let plan = load_or_default(args.config.as_deref())?;
    config::validate_plan(&plan)?;

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    let tool = tool::ToolCommand::parse(&plan.tool)?;
    println!("workdir: {}", plan.workdir.display());
    println!("stop_on_error: {}", plan.stop_on_error);
    for (index, request) in plan.requests.iter().enumerate() {
        let mut argv = tool.prefix_args.clone();
        argv.extend(request.args());
        println!(
            "{}. {}",
            index + 1,
            util::format_command_line(&tool.program, &argv)
        );
    }
    Ok(())
}

fn cmd_init(args: InitArgs) -> Result<()> {
    if args.config.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            args.config.display()
        ));
    }
    config::write_plan(&args.config, &config::default_plan())?;
    println!("Wrote plan to {}", args.config.display());
    Ok(())
}

fn load_or_default(path: Option<&Path>) -> Result<FetchPlan> {
    match path {
        Some(path) => config::load_plan(path),
        None => Ok(config::default_plan()),
    }
}
