use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{StorageError, TaskError};

/// The task database written by the task-decomposition CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    pub master: TaskList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub test_strategy: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub subtasks: Vec<Task>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status.eq_ignore_ascii_case("done")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

const STATUS_HEADING: &str = "## Completed Tasks\n\n";

pub fn load_tasks(path: &Path) -> Result<TaskFile, TaskError> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| TaskError::ParseTasks {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Append a checklist line for every finished task not yet recorded in
/// `status_file`. Existing content is never rewritten. A missing task file
/// means nothing has been decomposed yet. Returns the number of lines added.
pub fn sync_status(tasks_file: &Path, status_file: &Path) -> Result<usize, TaskError> {
    if !tasks_file.is_file() {
        debug!(path = %tasks_file.display(), "No task file yet, status unchanged");
        return Ok(0);
    }
    let tasks = load_tasks(tasks_file)?;

    let existing = match std::fs::read_to_string(status_file) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(StorageError::ReadFile {
                path: status_file.to_path_buf(),
                source: e,
            }
            .into())
        }
    };
    let recorded: Vec<&str> = existing
        .as_deref()
        .map(|c| c.lines().map(str::trim).collect())
        .unwrap_or_default();

    let new_lines: Vec<String> = tasks
        .master
        .tasks
        .iter()
        .filter(|t| t.is_done())
        .map(|t| format!("- [x] {}. {}", t.id, t.title))
        .filter(|line| !recorded.contains(&line.as_str()))
        .collect();

    if new_lines.is_empty() {
        return Ok(0);
    }

    if let Some(parent) = status_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut block = String::new();
    if existing.is_none() {
        block.push_str(STATUS_HEADING);
    } else if existing.as_deref().is_some_and(|c| !c.is_empty() && !c.ends_with('\n')) {
        block.push('\n');
    }
    for line in &new_lines {
        block.push_str(line);
        block.push('\n');
    }

    let append_err = |e| StorageError::AppendFile {
        path: status_file.to_path_buf(),
        source: e,
    };
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(status_file)
        .and_then(|mut f| f.write_all(block.as_bytes()))
        .map_err(append_err)?;

    info!(count = new_lines.len(), path = %status_file.display(), "Recorded completed tasks");
    Ok(new_lines.len())
}

/// Render the task database as a readable markdown task list.
pub fn render_task_list(tasks: &TaskFile) -> String {
    let mut out = String::new();
    for task in &tasks.master.tasks {
        out.push_str(&format!("## {}. {}\n\n", task.id, task.title));
        out.push_str(&format!("{}\n\n", task.description));
        out.push_str(&format!("{}\n\n", task.details));
        out.push_str(&format!("**Test Strategy**: {}\n\n\n", task.test_strategy));
        out.push_str("### Subtasks\n\n");
        for subtask in &task.subtasks {
            out.push_str(&format!("#### {}.{} {}\n\n", task.id, subtask.id, subtask.title));
            out.push_str(&format!("{}\n\n", subtask.description));
            out.push_str(&format!("{}\n\n", subtask.details));
            out.push_str(&format!("**Test Strategy**: {}\n\n\n", subtask.test_strategy));
        }
    }
    out
}

pub fn export_task_list(tasks_file: &Path, output: &Path) -> Result<usize, TaskError> {
    let tasks = load_tasks(tasks_file)?;
    std::fs::write(output, render_task_list(&tasks)).map_err(|e| StorageError::WriteFile {
        path: output.to_path_buf(),
        source: e,
    })?;
    Ok(tasks.master.tasks.len())
}
