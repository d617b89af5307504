pub mod assemble;
pub mod config;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod orchestrator;
pub mod phase;
pub mod pipeline;
pub mod tasks;
pub mod template;

pub use assemble::{assemble_functional_spec, Assembly};
pub use config::{load_config, Config, ConfigFormat};
pub use error::{
    AnalyzeError, ConfigError, DocpipeError, Result, StorageError, TaskError, TemplateError,
};
pub use markdown::{extract_headers, find_subsection_titles, Header};
pub use orchestrator::{GenerationOutcome, GenerationTimeout, Orchestrator, RetryPolicy};
pub use phase::{next_phase, PhasePattern};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, Stage};
pub use template::{DocKind, DocSpec, GenerationTask, TemplateRegistry};
