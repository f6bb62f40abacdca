//! Invocation sequencing for datastore updates.
//!
//! Each request becomes one blocking run of the update tool. The tool runs
//! with an explicit working directory, so the process-wide cwd never moves.
//! Tool failures are recorded as step outcomes rather than errors; only setup
//! problems (bad plan, missing directory, unresolvable tool) abort the run.
use crate::config::{validate_plan, FetchPlan};
use crate::tool::ToolCommand;
use crate::util::{format_command_line, now_epoch_ms};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Exit status reported for a step whose program could not be spawned.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// A single fully resolved run of the update tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        format_command_line(&self.program.display().to_string(), &self.args)
    }
}

/// Runs one invocation to completion.
///
/// `Ok(Some(code))` is a normal exit, `Ok(None)` a termination without an
/// exit code (signal), and `Err` a failure to start the program at all.
pub trait Invoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<Option<i32>>;
}

/// Spawns the tool as a child process with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<Option<i32>> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .with_context(|| format!("spawn {}", invocation.program.display()))?;
        Ok(status.code())
    }
}

/// A validated plan with every invocation built and the tool resolved.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub workdir: PathBuf,
    pub tool: String,
    pub stop_on_error: bool,
    pub invocations: Vec<Invocation>,
}

/// Validate the plan and build its invocations relative to `base_dir`.
pub fn prepare(plan: &FetchPlan, base_dir: &Path) -> Result<PreparedRun> {
    validate_plan(plan)?;
    let workdir = base_dir.join(&plan.workdir);
    if !workdir.is_dir() {
        return Err(anyhow!(
            "working directory {} does not exist",
            workdir.display()
        ));
    }
    let tool = ToolCommand::parse(&plan.tool)?;
    let program = tool.resolve(&workdir)?;
    tracing::debug!(
        program = %program.display(),
        workdir = %workdir.display(),
        "resolved update tool"
    );

    let invocations = plan
        .requests
        .iter()
        .map(|request| {
            let mut args = tool.prefix_args.clone();
            args.extend(request.args());
            Invocation {
                program: program.clone(),
                args,
                cwd: workdir.clone(),
            }
        })
        .collect();

    Ok(PreparedRun {
        workdir,
        tool: plan.tool.clone(),
        stop_on_error: plan.stop_on_error,
        invocations,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 1-based position in the plan.
    pub step: usize,
    pub args: Vec<String>,
    pub command_line: String,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
    pub duration_ms: u128,
}

impl StepOutcome {
    fn process_exit_code(&self) -> i32 {
        match (self.exit_code, &self.error) {
            (Some(code), _) => code,
            (None, Some(_)) => SPAWN_FAILURE_EXIT_CODE,
            (None, None) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub workdir: PathBuf,
    pub tool: String,
    pub stop_on_error: bool,
    /// Steps remained unattempted because of `stop_on_error`.
    pub halted: bool,
    pub steps: Vec<StepOutcome>,
}

impl RunReport {
    /// Exit status of the last attempted step, or 0 when nothing ran.
    pub fn exit_code(&self) -> i32 {
        self.steps
            .last()
            .map(StepOutcome::process_exit_code)
            .unwrap_or(0)
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.success).count()
    }
}

/// Run every prepared invocation in order.
pub fn run(prepared: &PreparedRun, invoker: &mut dyn Invoker) -> Result<RunReport> {
    let started_at_epoch_ms = now_epoch_ms()?;
    let total = prepared.invocations.len();
    let mut steps = Vec::with_capacity(total);
    let mut halted = false;

    if total == 0 {
        tracing::warn!("plan has no requests; nothing to fetch");
    }

    for (index, invocation) in prepared.invocations.iter().enumerate() {
        let step = index + 1;
        let command_line = invocation.command_line();
        tracing::info!(step, total, command = %command_line, "invoking update tool");

        let start = Instant::now();
        let result = invoker.invoke(invocation);
        let duration_ms = start.elapsed().as_millis();

        let (exit_code, error) = match result {
            Ok(code) => (code, None),
            Err(err) => (None, Some(format!("{err:#}"))),
        };
        let success = exit_code == Some(0);
        if success {
            tracing::info!(step, duration_ms, "update tool finished");
        } else {
            tracing::warn!(
                step,
                exit_code = ?exit_code,
                error = error.as_deref().unwrap_or(""),
                "update tool failed"
            );
        }
        steps.push(StepOutcome {
            step,
            args: invocation.args.clone(),
            command_line,
            exit_code,
            error,
            success,
            duration_ms,
        });

        if !success && prepared.stop_on_error && step < total {
            tracing::warn!(skipped = total - step, "stopping after failed step");
            halted = true;
            break;
        }
    }

    let report = RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        started_at_epoch_ms,
        finished_at_epoch_ms: now_epoch_ms()?,
        workdir: prepared.workdir.clone(),
        tool: prepared.tool.clone(),
        stop_on_error: prepared.stop_on_error,
        halted,
        steps,
    };
    tracing::info!(
        attempted = report.steps.len(),
        failed = report.failed_steps(),
        exit_code = report.exit_code(),
        "datastore update finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
