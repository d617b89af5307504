use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::TaskError;

/// The external task-decomposition tool.
pub trait TaskTracker {
    /// Turn a PRD into tasks in the tracker's database.
    fn parse_prd(&self, prd: &Path) -> Result<(), TaskError>;
    /// Expand every task into subtasks.
    fn expand_all(&self) -> Result<(), TaskError>;
}

/// Used when task tracking is disabled in the config.
pub struct NoopTaskTracker;

impl TaskTracker for NoopTaskTracker {
    fn parse_prd(&self, prd: &Path) -> Result<(), TaskError> {
        debug!(path = %prd.display(), "Task tracking disabled, not parsing PRD");
        Ok(())
    }

    fn expand_all(&self) -> Result<(), TaskError> {
        Ok(())
    }
}

pub struct CommandTaskTracker {
    program: String,
    parse_prd_args: Vec<String>,
    expand_args: Vec<String>,
    working_directory: PathBuf,
}

impl CommandTaskTracker {
    pub fn new(
        program: impl Into<String>,
        parse_prd_args: Vec<String>,
        expand_args: Vec<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            parse_prd_args,
            expand_args,
            working_directory: working_directory.into(),
        }
    }

    fn run(&self, args: &[String], extra: Option<&Path>) -> Result<(), TaskError> {
        let mut command = Command::new(&self.program);
        command.args(args).current_dir(&self.working_directory);
        if let Some(path) = extra {
            command.arg(path);
        }

        let output = command.output().map_err(|e| TaskError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(TaskError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl TaskTracker for CommandTaskTracker {
    fn parse_prd(&self, prd: &Path) -> Result<(), TaskError> {
        info!(path = %prd.display(), "Parsing PRD into tasks");
        self.run(&self.parse_prd_args, Some(prd))
    }

    fn expand_all(&self) -> Result<(), TaskError> {
        info!("Expanding all tasks");
        self.run(&self.expand_args, None)
    }
}
