use serde::{Deserialize, Serialize};

use crate::orchestrator::BackoffStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Root every other relative path hangs off. Relative values resolve
    /// against the config file's directory.
    #[serde(default = "default_working_directory")]
    pub working_directory: String,
    /// Source of the application being documented.
    #[serde(default = "default_source_code_directory")]
    pub source_code_directory: String,
    #[serde(default = "default_docs_directory")]
    pub docs_directory: String,
    /// Where the rebuilt application lives; PRD phases build on it.
    #[serde(default = "default_new_app_directory")]
    pub new_app_directory: String,
    /// Directory of `<template>.md` files replacing the built-in prompts.
    #[serde(default)]
    pub templates_directory: Option<String>,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub task_tracker: TaskTrackerConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_working_directory() -> String {
    ".".to_string()
}

fn default_source_code_directory() -> String {
    "app".to_string()
}

fn default_docs_directory() -> String {
    "docs".to_string()
}

fn default_new_app_directory() -> String {
    "new_app".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            working_directory: default_working_directory(),
            source_code_directory: default_source_code_directory(),
            docs_directory: default_docs_directory(),
            new_app_directory: default_new_app_directory(),
            templates_directory: None,
            reports: ReportsConfig::default(),
            outputs: OutputsConfig::default(),
            generator: GeneratorConfig::default(),
            retry: RetryConfig::default(),
            task_tracker: TaskTrackerConfig::default(),
            assembly: AssemblyConfig::default(),
        }
    }
}

/// Code analysis reports the journeys are discovered from. Relative to the
/// docs directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub directory: String,
    pub detailed_journeys: String,
    pub data_layer: String,
    /// Parent section whose direct children are the journeys.
    pub journeys_section: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: "codmod_reports".to_string(),
            detailed_journeys: "detailed_journeys.md".to_string(),
            data_layer: "data_layer.md".to_string(),
            journeys_section: "User Journeys".to_string(),
        }
    }
}

/// Generated artifacts, relative to the docs directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputsConfig {
    pub user_journeys: String,
    pub brds: String,
    pub functional_spec_intro: String,
    pub database_definition: String,
    pub database_erd: String,
    pub api_definition: String,
    pub api_dependencies: String,
    pub api_plan: String,
    pub api_detail_design: String,
    pub prds: String,
    pub prd_prefix: String,
    pub example_prd: String,
    pub architecture_principles: String,
    pub functional_spec: String,
    pub run_report: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            user_journeys: "user_journeys".to_string(),
            brds: "brds".to_string(),
            functional_spec_intro: "functional_specs_introduction.md".to_string(),
            database_definition: "database_design/database_definition.md".to_string(),
            database_erd: "database_design/database_erd.md".to_string(),
            api_definition: "api_design/api_definition.md".to_string(),
            api_dependencies: "api_design/api_dependencies.md".to_string(),
            api_plan: "api_design/api_plan.md".to_string(),
            api_detail_design: "api_design/api_detail_design.md".to_string(),
            prds: "prds".to_string(),
            prd_prefix: "prd_phase_".to_string(),
            example_prd: "prds/example.md".to_string(),
            architecture_principles: "context_docs/architecture_principles.md".to_string(),
            functional_spec: "final_functional_specification.md".to_string(),
            run_report: ".docpipe/last_run.json".to_string(),
        }
    }
}

/// The AI CLI, invoked as `<program> <args...> <prompt>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "gemini".to_string(),
            args: vec!["-y".to_string(), "-p".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffStrategy::Linear,
            delay_secs: 5,
        }
    }
}

/// Task-decomposition CLI. Its files are relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTrackerConfig {
    pub enabled: bool,
    pub program: String,
    pub parse_prd_args: Vec<String>,
    pub expand_args: Vec<String>,
    pub tasks_file: String,
    pub status_file: String,
    pub task_list: String,
}

impl Default for TaskTrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "task-master".to_string(),
            parse_prd_args: vec!["parse-prd".to_string(), "--append".to_string()],
            expand_args: vec!["expand".to_string(), "--all".to_string()],
            tasks_file: ".taskmaster/tasks/tasks.json".to_string(),
            status_file: ".taskmaster/current_status.md".to_string(),
            task_list: "task_list.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default)]
    pub extra_sections: Vec<ExtraSection>,
}

/// A section copied from a report into the assembled functional spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraSection {
    /// Report path, relative to the docs directory.
    pub source: String,
    pub header: String,
    pub new_level: usize,
}
