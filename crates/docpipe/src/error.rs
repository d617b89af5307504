use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocpipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Markdown analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Task tracker error: {0}")]
    Task(#[from] TaskError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to resolve working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Section '{title}' not found")]
    SectionNotFound { title: String },
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{template}' is missing substitutions for: {}", .keys.join(", "))]
    MissingKey {
        template: &'static str,
        keys: Vec<String>,
    },

    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("Template override '{path}' for '{template}' never mentions ${target_key}")]
    MissingTargetPlaceholder {
        template: &'static str,
        target_key: &'static str,
        path: PathBuf,
    },

    #[error("Failed to read template override '{path}': {source}")]
    ReadOverride {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to file '{path}': {source}")]
    AppendFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Failed to parse task file '{path}': {source}")]
    ParseTasks {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, DocpipeError>;
