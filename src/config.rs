//! Fetch plan configuration.
//!
//! The plan is an ordered list of requests plus the tool command, the
//! directory it runs from, and the failure policy. A built-in default mirrors
//! the stock datastore refresh; a JSON file can replace it.
use crate::request::{FetchRequest, Source, StateCode};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const PLAN_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_TOOL: &str = "python update_datastore.py";
pub const DEFAULT_WORKDIR: &str = "scripts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPlan {
    pub schema_version: u32,
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// Halt after the first failed invocation instead of continuing.
    #[serde(default)]
    pub stop_on_error: bool,
    #[serde(default)]
    pub requests: Vec<FetchRequest>,
}

fn default_tool() -> String {
    DEFAULT_TOOL.to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKDIR)
}

fn default_requests() -> Vec<FetchRequest> {
    let colorado = StateCode::known("CO");
    vec![
        FetchRequest::new([Source::Ferc1, Source::Eia860]).with_years([2012, 2016]),
        FetchRequest::new([Source::Eia923]).with_years([2016]),
        FetchRequest::new([Source::Epacems])
            .with_states([colorado])
            .with_years([2016]),
    ]
}

/// Build the plan used when no config file is given.
pub fn default_plan() -> FetchPlan {
    FetchPlan {
        schema_version: PLAN_SCHEMA_VERSION,
        tool: default_tool(),
        workdir: default_workdir(),
        stop_on_error: false,
        requests: default_requests(),
    }
}

pub fn load_plan(path: &Path) -> Result<FetchPlan> {
    let bytes = fs::read(path).with_context(|| format!("read plan {}", path.display()))?;
    let plan: FetchPlan = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse plan JSON {}", path.display()))?;
    Ok(plan)
}

/// Persist a plan to disk in a stable JSON format.
pub fn write_plan(path: &Path, plan: &FetchPlan) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(plan).context("serialize plan")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema, tool command, workdir, and every request.
pub fn validate_plan(plan: &FetchPlan) -> Result<()> {
    if plan.schema_version != PLAN_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported plan schema_version {}",
            plan.schema_version
        ));
    }
    if plan.tool.trim().is_empty() {
        return Err(anyhow!("tool must be non-empty"));
    }
    validate_relative_path(&plan.workdir, "workdir")?;
    for (index, request) in plan.requests.iter().enumerate() {
        request
            .validate()
            .with_context(|| format!("invalid request #{}", index + 1))?;
    }
    Ok(())
}

fn validate_relative_path(path: &Path, label: &str) -> Result<()> {
    if path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {:?})",
            path.display().to_string()
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
