use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Prompt rendering failed: {0}")]
    Template(#[from] crate::error::TemplateError),

    #[error("Report analysis failed: {0}")]
    Analyze(#[from] crate::error::AnalyzeError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Task tracking failed: {0}")]
    Task(#[from] crate::error::TaskError),

    #[error("Required input '{}' is missing", .0.display())]
    MissingInput(PathBuf),

    #[error("Failed to serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}
