//! Update tool command line handling.
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// The update tool split into its program and leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub prefix_args: Vec<String>,
}

impl ToolCommand {
    pub fn parse(command: &str) -> Result<Self> {
        let mut words = shell_words::split(command)
            .with_context(|| format!("parse tool command: {command}"))?;
        if words.is_empty() {
            return Err(anyhow!("tool command is empty"));
        }
        let program = words.remove(0);
        Ok(ToolCommand {
            program,
            prefix_args: words,
        })
    }

    /// Resolve the program the way a shell started in `cwd` would.
    ///
    /// Bare names search `PATH`; names with a separator resolve against `cwd`.
    pub fn resolve(&self, cwd: &Path) -> Result<PathBuf> {
        which::which_in(&self.program, env::var_os("PATH"), cwd).with_context(|| {
            format!(
                "resolve tool program {:?} from {}",
                self.program,
                cwd.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ToolCommand;

    #[test]
    fn splits_program_from_prefix_args() {
        let tool = ToolCommand::parse("python 'update datastore.py' -v").unwrap();
        assert_eq!(tool.program, "python");
        assert_eq!(tool.prefix_args, vec!["update datastore.py", "-v"]);
    }

    #[test]
    fn rejects_empty_and_unbalanced_commands() {
        assert!(ToolCommand::parse("  ").is_err());
        assert!(ToolCommand::parse("python 'update_datastore.py").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn resolves_relative_programs_against_cwd() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("update.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").expect("write script");
        let mut perms = std::fs::metadata(&script).expect("stat script").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod script");

        let tool = ToolCommand::parse("./update.sh").unwrap();
        let resolved = tool.resolve(dir.path()).expect("resolve relative program");
        assert_eq!(
            resolved.canonicalize().unwrap(),
            script.canonicalize().unwrap()
        );
    }

    #[test]
    fn unresolvable_program_names_the_program() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let tool = ToolCommand::parse("definitely-not-a-real-update-tool").unwrap();
        let err = tool.resolve(dir.path()).expect_err("missing program");
        assert!(format!("{err:#}").contains("definitely-not-a-real-update-tool"));
    }
}
