pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod report;
pub mod runner;
pub mod stage;

pub use config::{PipelineConfig, SectionSource};
pub use context::PipelineContext;
pub use error::PipelineError;
pub use progress::{ConsoleProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use report::{RunReport, StepOutcome, StepRecord};
pub use runner::Pipeline;
pub use stage::Stage;
