use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use docpipe::config::{load_config, validate_config, Config};
use docpipe::logging::{init_logging, LogFormat};
use docpipe::pipeline::{ConsoleProgress, Pipeline, PipelineConfig, Stage, StepOutcome};
use docpipe::tasks::{export_task_list, sync_status};
use docpipe::template::{DocKind, GenerationTask, TemplateRegistry};
use docpipe::{assemble_functional_spec, next_phase};

const DEFAULT_CONFIG_FILES: [&str; 3] = ["docpipe.json", "docpipe.yaml", "docpipe.yml"];

/// Drive an AI CLI through the documentation graph, one artifact at a time.
#[derive(Parser, Debug)]
#[command(name = "docpipe", version, about)]
struct Cli {
    /// Config file (JSON or YAML). Defaults to ./docpipe.{json,yaml,yml} if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when DOCPIPE_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    /// Override retry.max_attempts
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Override retry.delay_secs
    #[arg(long, global = true)]
    delay_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline, or only the given stages
    Run {
        /// Stage to run; repeatable. All stages when omitted
        #[arg(long = "stage")]
        stages: Vec<Stage>,
    },
    /// List the journeys found in the detailed journeys report
    Journeys,
    /// Print the PRD phase the next run would generate
    NextPhase,
    /// Print a rendered prompt
    Render {
        template: DocKind,
        /// Extra substitution; repeatable
        #[arg(long = "set", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
        /// File the prompt should ask the generator to write
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Rebuild the final functional specification
    Assemble,
    /// Write the task database as a markdown task list
    ExportTasks {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Record finished tasks in the status checklist
    SyncStatus,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let layout = Arc::new(resolve_layout(&cli).context("resolving configuration")?);

    match cli.command {
        Command::Run { stages } => run(layout, &stages),
        Command::Journeys => {
            let pipeline = Pipeline::from_config(layout)?;
            for title in pipeline.journey_titles()? {
                println!("{}", title);
            }
            Ok(())
        }
        Command::NextPhase => {
            println!("{}", next_phase(&layout.prds_directory, &layout.prd_pattern));
            Ok(())
        }
        Command::Render {
            template,
            set,
            target,
        } => Ok(render(&layout, template, set, target)?),
        Command::Assemble => {
            let assembly = assemble_functional_spec(&layout)?;
            println!(
                "Wrote {} ({} sections, {} journeys)",
                assembly.output.display(),
                assembly.sections,
                assembly.journeys
            );
            Ok(())
        }
        Command::ExportTasks { output } => {
            let output = output.unwrap_or_else(|| layout.task_list.clone());
            let count = export_task_list(&layout.tasks_file, &output)?;
            println!("Exported {} tasks to {}", count, output.display());
            Ok(())
        }
        Command::SyncStatus => {
            let added = sync_status(&layout.tasks_file, &layout.status_file)?;
            println!("Recorded {} completed tasks in {}", added, layout.status_file.display());
            Ok(())
        }
    }
}

fn run(layout: Arc<PipelineConfig>, stages: &[Stage]) -> Result<()> {
    let report_path = layout.run_report.clone();
    let pipeline = Pipeline::from_config(layout)?;

    let report = pipeline.run(stages, &ConsoleProgress)?;
    report
        .write(&report_path)
        .with_context(|| format!("writing run report to {}", report_path.display()))?;

    let skipped = report.count(|o| matches!(o, StepOutcome::Skipped));
    let generated = report.count(|o| matches!(o, StepOutcome::Generated { .. }));
    println!(
        "Done: {} generated, {} already present, {} not created",
        generated,
        skipped,
        report.timed_out().count()
    );
    for step in report.timed_out() {
        warn!(stage = %step.stage, path = %step.target.display(), "Not created");
    }
    info!(run_id = %report.run_id, path = %report_path.display(), "Run report written");
    Ok(())
}

fn render(
    layout: &PipelineConfig,
    kind: DocKind,
    set: Vec<(String, String)>,
    target: Option<PathBuf>,
) -> docpipe::Result<()> {
    let templates = TemplateRegistry::load(layout.templates_directory.as_deref())?;
    let spec = templates.get(kind);

    let mut subs: HashMap<String, String> = layout.context_substitutions();
    subs.insert(
        "phase_number".to_string(),
        next_phase(&layout.prds_directory, &layout.prd_pattern).to_string(),
    );
    subs.extend(set);

    let prompt = match target {
        Some(target) => GenerationTask::new(spec, subs, target, kind.name())?.prompt,
        None => spec.render(&subs)?,
    };
    println!("{}", prompt);
    Ok(())
}

fn resolve_layout(cli: &Cli) -> docpipe::Result<PipelineConfig> {
    let (mut config, base_dir) = match config_path(cli.config.as_deref()) {
        Some(path) => {
            let config = load_config(&path)?;
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            info!(path = %path.display(), "Loaded config");
            (config, base_dir)
        }
        None => (Config::default(), PathBuf::from(".")),
    };

    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if let Some(delay_secs) = cli.delay_secs {
        config.retry.delay_secs = delay_secs;
    }
    validate_config(&config)?;

    Ok(PipelineConfig::from_config(&config, &base_dir)?)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    DEFAULT_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}
