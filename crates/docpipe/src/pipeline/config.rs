use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::ConfigError;
use crate::orchestrator::{BackoffPolicy, RetryPolicy};
use crate::phase::PhasePattern;
use crate::template::task::path_string;

/// A report section copied into the assembled functional spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSource {
    pub source: PathBuf,
    pub header: String,
    pub new_level: usize,
}

/// Every path the pipeline touches, resolved to an absolute path once.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub working_directory: PathBuf,
    pub source_code_directory: PathBuf,
    pub docs_directory: PathBuf,
    pub new_app_directory: PathBuf,
    pub templates_directory: Option<PathBuf>,

    pub reports_directory: PathBuf,
    pub detailed_journeys_report: PathBuf,
    pub data_layer_report: PathBuf,
    pub journeys_section: String,

    pub user_journeys_directory: PathBuf,
    pub brds_directory: PathBuf,
    pub functional_spec_intro: PathBuf,
    pub database_definition: PathBuf,
    pub database_erd: PathBuf,
    pub api_definition: PathBuf,
    pub api_dependencies: PathBuf,
    pub api_plan: PathBuf,
    pub api_detail_design: PathBuf,
    pub prds_directory: PathBuf,
    pub prd_pattern: PhasePattern,
    pub example_prd: PathBuf,
    pub architecture_principles: PathBuf,
    pub functional_spec: PathBuf,
    pub run_report: PathBuf,
    pub extra_sections: Vec<SectionSource>,

    pub generator_program: String,
    pub generator_args: Vec<String>,
    pub retry: RetryPolicy,

    pub task_tracker_enabled: bool,
    pub task_tracker_program: String,
    pub parse_prd_args: Vec<String>,
    pub expand_args: Vec<String>,
    pub tasks_file: PathBuf,
    pub status_file: PathBuf,
    pub task_list: PathBuf,
}

impl PipelineConfig {
    /// Resolve `config` against `base_dir`, normally the config file's directory.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, ConfigError> {
        let base_dir = if base_dir.is_absolute() {
            base_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::WorkingDirectory)?
                .join(base_dir)
        };

        let working = resolve(&base_dir, &config.working_directory);
        let docs = resolve(&working, &config.docs_directory);
        let reports = resolve(&docs, &config.reports.directory);
        let outputs = &config.outputs;
        let tracker = &config.task_tracker;

        Ok(Self {
            source_code_directory: resolve(&working, &config.source_code_directory),
            new_app_directory: resolve(&working, &config.new_app_directory),
            templates_directory: config
                .templates_directory
                .as_deref()
                .map(|dir| resolve(&working, dir)),

            detailed_journeys_report: resolve(&reports, &config.reports.detailed_journeys),
            data_layer_report: resolve(&reports, &config.reports.data_layer),
            journeys_section: config.reports.journeys_section.clone(),
            reports_directory: reports,

            user_journeys_directory: resolve(&docs, &outputs.user_journeys),
            brds_directory: resolve(&docs, &outputs.brds),
            functional_spec_intro: resolve(&docs, &outputs.functional_spec_intro),
            database_definition: resolve(&docs, &outputs.database_definition),
            database_erd: resolve(&docs, &outputs.database_erd),
            api_definition: resolve(&docs, &outputs.api_definition),
            api_dependencies: resolve(&docs, &outputs.api_dependencies),
            api_plan: resolve(&docs, &outputs.api_plan),
            api_detail_design: resolve(&docs, &outputs.api_detail_design),
            prds_directory: resolve(&docs, &outputs.prds),
            prd_pattern: PhasePattern::new(outputs.prd_prefix.clone(), ".md"),
            example_prd: resolve(&docs, &outputs.example_prd),
            architecture_principles: resolve(&docs, &outputs.architecture_principles),
            functional_spec: resolve(&docs, &outputs.functional_spec),
            run_report: resolve(&docs, &outputs.run_report),
            extra_sections: config
                .assembly
                .extra_sections
                .iter()
                .map(|s| SectionSource {
                    source: resolve(&docs, &s.source),
                    header: s.header.clone(),
                    new_level: s.new_level,
                })
                .collect(),

            generator_program: config.generator.program.clone(),
            generator_args: config.generator.args.clone(),
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                backoff: BackoffPolicy::from_strategy(
                    config.retry.backoff,
                    Duration::from_secs(config.retry.delay_secs),
                ),
            },

            task_tracker_enabled: tracker.enabled,
            task_tracker_program: tracker.program.clone(),
            parse_prd_args: tracker.parse_prd_args.clone(),
            expand_args: tracker.expand_args.clone(),
            tasks_file: resolve(&working, &tracker.tasks_file),
            status_file: resolve(&working, &tracker.status_file),
            task_list: resolve(&working, &tracker.task_list),

            docs_directory: docs,
            working_directory: working,
        })
    }

    /// Values every prompt may reference. Per-step keys are added on top.
    pub fn context_substitutions(&self) -> HashMap<String, String> {
        let entries: [(&str, &PathBuf); 16] = [
            ("source_code_directory", &self.source_code_directory),
            ("application_directory", &self.source_code_directory),
            ("docs_directory", &self.docs_directory),
            ("new_app_directory", &self.new_app_directory),
            ("codmod_reports_directory", &self.reports_directory),
            ("codmod_detailed_file_path", &self.detailed_journeys_report),
            ("codmod_data_file_path", &self.data_layer_report),
            ("user_journey_directory", &self.user_journeys_directory),
            ("brd_directory", &self.brds_directory),
            ("database_design_absolute_file_path", &self.database_definition),
            ("api_definition_absolute_path", &self.api_definition),
            ("api_dependencies_absolute_path", &self.api_dependencies),
            ("api_plan_absolute_path", &self.api_plan),
            ("api_detail_design_absolute_path", &self.api_detail_design),
            ("architecture_principles_absolute_path", &self.architecture_principles),
            ("example_prd_file_path", &self.example_prd),
        ];

        entries
            .into_iter()
            .map(|(key, path)| (key.to_string(), path_string(path)))
            .collect()
    }

    /// Output file for a journey title: spaces become underscores.
    pub fn user_journey_path(&self, title: &str) -> PathBuf {
        self.user_journeys_directory
            .join(format!("{}.md", title.replace(' ', "_")))
    }

    /// BRD for a journey file, sharing its file name.
    pub fn brd_path(&self, journey_file: &Path) -> PathBuf {
        match journey_file.file_name() {
            Some(name) => self.brds_directory.join(name),
            None => self.brds_directory.join("brd.md"),
        }
    }
}

/// `relative` joined onto `base` unless already absolute, with `.` segments dropped.
fn resolve(base: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
