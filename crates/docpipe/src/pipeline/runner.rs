use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::error::StorageError;
use crate::markdown::{extract_headers, find_subsection_titles};
use crate::orchestrator::{CommandGenerator, Orchestrator};
use crate::phase::next_phase;
use crate::tasks::{sync_status, CommandTaskTracker, NoopTaskTracker, TaskTracker};
use crate::template::task::path_string;
use crate::template::{DocKind, GenerationTask, TemplateRegistry};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::report::{RunReport, StepOutcome, StepRecord};
use super::stage::Stage;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    templates: TemplateRegistry,
    orchestrator: Orchestrator,
    tracker: Box<dyn TaskTracker>,
}

impl Pipeline {
    /// Production constructor: external CLIs from config, templates loaded
    /// from the override directory if one is configured.
    pub fn from_config(config: Arc<PipelineConfig>) -> Result<Self, PipelineError> {
        let templates = TemplateRegistry::load(config.templates_directory.as_deref())?;

        let generator =
            CommandGenerator::new(&config.generator_program, config.generator_args.clone())
                .with_working_directory(&config.working_directory);
        let orchestrator = Orchestrator::new(Box::new(generator), config.retry);

        let tracker: Box<dyn TaskTracker> = if config.task_tracker_enabled {
            Box::new(CommandTaskTracker::new(
                &config.task_tracker_program,
                config.parse_prd_args.clone(),
                config.expand_args.clone(),
                &config.working_directory,
            ))
        } else {
            Box::new(NoopTaskTracker)
        };

        Ok(Self::new(config, templates, orchestrator, tracker))
    }

    /// Inject specific sub-components.
    pub fn new(
        config: Arc<PipelineConfig>,
        templates: TemplateRegistry,
        orchestrator: Orchestrator,
        tracker: Box<dyn TaskTracker>,
    ) -> Self {
        Self {
            config,
            templates,
            orchestrator,
            tracker,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Journey titles listed under the configured parent section of the
    /// detailed journeys report.
    pub fn journey_titles(&self) -> Result<Vec<String>, PipelineError> {
        let report = read_input(&self.config.detailed_journeys_report)?;
        let headers = extract_headers(&report);
        Ok(find_subsection_titles(&headers, &self.config.journeys_section)?)
    }

    /// One generation task per journey, in report order.
    pub fn plan_user_journeys(&self) -> Result<Vec<GenerationTask>, PipelineError> {
        let spec = self.templates.get(DocKind::UserJourney);

        self.journey_titles()?
            .into_iter()
            .map(|title| -> Result<GenerationTask, PipelineError> {
                let mut subs = self.config.context_substitutions();
                subs.insert("user_journey_name".to_string(), title.clone());
                let target = self.config.user_journey_path(&title);
                let description = format!("Generating user journey '{}'", title);
                Ok(GenerationTask::new(spec, subs, target, description)?)
            })
            .collect()
    }

    /// Run `stages` in pipeline order, or every stage when empty.
    pub fn run(
        &self,
        stages: &[Stage],
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let mut ctx = PipelineContext::new();
        let _pipeline_span = info_span!("pipeline",
            run_id = %ctx.report.run_id,
            docs = %self.config.docs_directory.display(),
        )
        .entered();

        for stage in Stage::ALL {
            if !stages.is_empty() && !stages.contains(&stage) {
                continue;
            }

            let _step = info_span!("stage", stage = %stage).entered();
            progress.report(ProgressEvent::Stage { stage });
            self.run_stage(stage, &mut ctx, progress)?;
        }

        ctx.report.finish();
        info!(
            steps = ctx.report.steps.len(),
            generated = ctx
                .report
                .count(|o| matches!(o, StepOutcome::Generated { .. })),
            timed_out = ctx.report.timed_out().count(),
            "Pipeline finished"
        );
        Ok(ctx.report)
    }

    fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let config = &self.config;
        match stage {
            Stage::UserJourneys => self.step_user_journeys(ctx, progress),
            Stage::Brds => self.step_brds(ctx, progress),
            Stage::FunctionalSpecIntro => self.step_document(
                stage,
                DocKind::FunctionalSpecIntro,
                &config.functional_spec_intro,
                ctx,
                progress,
            ),
            Stage::DatabaseDefinition => self.step_document(
                stage,
                DocKind::DatabaseDefinition,
                &config.database_definition,
                ctx,
                progress,
            ),
            Stage::DatabaseErd => self.step_document(
                stage,
                DocKind::DatabaseErd,
                &config.database_erd,
                ctx,
                progress,
            ),
            Stage::ApiDefinition => self.step_document(
                stage,
                DocKind::ApiDefinition,
                &config.api_definition,
                ctx,
                progress,
            ),
            Stage::ApiDependencies => self.step_document(
                stage,
                DocKind::ApiDependencies,
                &config.api_dependencies,
                ctx,
                progress,
            ),
            Stage::ApiPlan => {
                self.step_document(stage, DocKind::ApiPlan, &config.api_plan, ctx, progress)
            }
            Stage::ApiDetailDesign => self.step_document(
                stage,
                DocKind::ApiDetailDesign,
                &config.api_detail_design,
                ctx,
                progress,
            ),
            Stage::Prd => self.step_prd(ctx, progress),
        }
    }

    fn step_user_journeys(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let tasks = self.plan_user_journeys()?;
        debug!(count = tasks.len(), "Planned user journeys");

        let mut files = Vec::with_capacity(tasks.len());
        for task in &tasks {
            files.push(task.target_path.clone());
            self.generate(Stage::UserJourneys, task, ctx, progress)?;
        }

        ctx.journey_files = Some(files);
        Ok(())
    }

    fn step_brds(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let journey_files = match ctx.journey_files.take() {
            Some(files) => files,
            None => self
                .plan_user_journeys()?
                .into_iter()
                .map(|task| task.target_path)
                .collect(),
        };

        let spec = self.templates.get(DocKind::Brd);
        for journey in &journey_files {
            let mut subs = self.config.context_substitutions();
            subs.insert("user_journey_absolute_path".to_string(), path_string(journey));
            let target = self.config.brd_path(journey);
            let description = format!("Generating BRD for {}", journey.display());
            let task = GenerationTask::new(spec, subs, target, description)?;
            self.generate(Stage::Brds, &task, ctx, progress)?;
        }

        ctx.journey_files = Some(journey_files);
        Ok(())
    }

    fn step_document(
        &self,
        stage: Stage,
        kind: DocKind,
        target: &Path,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let description = format!("Generating {}", target.display());
        let task = GenerationTask::new(
            self.templates.get(kind),
            self.config.context_substitutions(),
            target,
            description,
        )?;
        self.generate(stage, &task, ctx, progress)?;
        Ok(())
    }

    fn step_prd(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let config = &self.config;
        let phase = next_phase(&config.prds_directory, &config.prd_pattern);
        let target = config.prds_directory.join(config.prd_pattern.file_name(phase));
        info!(phase, path = %target.display(), "Next PRD phase");

        let mut subs: HashMap<String, String> = config.context_substitutions();
        subs.insert("phase_number".to_string(), phase.to_string());
        let description = format!("Generating PRD phase {} at {}", phase, target.display());
        let task = GenerationTask::new(self.templates.get(DocKind::Prd), subs, &target, description)?;

        if !self.generate(Stage::Prd, &task, ctx, progress)? {
            warn!(phase, "PRD was not generated, skipping task hand-off");
            return Ok(());
        }

        if config.task_tracker_enabled {
            match sync_status(&config.tasks_file, &config.status_file) {
                Ok(added) => debug!(added, "Synced completed tasks"),
                Err(e) => warn!("Failed to sync task status: {}", e),
            }
        }

        let status = read_optional(&config.status_file)?;
        let design = read_input(&config.api_detail_design)?;
        append_to_existing(&target, &[status.as_str(), design.as_str()])?;
        progress.report(ProgressEvent::Note {
            message: format!("Appended task status and API design to {}", target.display()),
        });

        if let Err(e) = self.tracker.parse_prd(&target) {
            warn!(path = %target.display(), "Task tracker failed to parse PRD: {}", e);
        }
        if let Err(e) = self.tracker.expand_all() {
            warn!("Task tracker failed to expand tasks: {}", e);
        }

        Ok(())
    }

    /// Run one task through the orchestrator and record the outcome. Returns
    /// whether the target exists afterwards; timeouts are not errors.
    fn generate(
        &self,
        stage: Stage,
        task: &GenerationTask,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<bool, PipelineError> {
        if let Some(parent) = task.target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let result = self.orchestrator.ensure_generated(task, progress);
        if let Err(ref timeout) = result {
            warn!(stage = %stage, "Giving up: {}", timeout);
        }

        ctx.report.steps.push(StepRecord {
            stage,
            target: task.target_path.clone(),
            outcome: StepOutcome::from(&result),
        });
        Ok(result.is_ok())
    }
}

/// Read a file a step depends on. Absence means an earlier step failed.
fn read_input(path: &Path) -> Result<String, PipelineError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::MissingInput(path.to_path_buf()))
        }
        Err(e) => Err(StorageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        }
        .into()),
    }
}

fn read_optional(path: &Path) -> Result<String, PipelineError> {
    match read_input(path) {
        Err(PipelineError::MissingInput(_)) => Ok(String::new()),
        other => other,
    }
}

/// Append `parts` to `path` without creating it.
fn append_to_existing(path: &Path, parts: &[&str]) -> Result<(), PipelineError> {
    let append_err = |e| StorageError::AppendFile {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(append_err)?;

    for part in parts.iter().filter(|p| !p.is_empty()) {
        let separated = if part.ends_with('\n') {
            format!("\n{}", part)
        } else {
            format!("\n{}\n", part)
        };
        file.write_all(separated.as_bytes()).map_err(append_err)?;
    }
    Ok(())
}
