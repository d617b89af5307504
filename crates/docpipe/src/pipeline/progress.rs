use std::path::PathBuf;

use super::stage::Stage;

/// Events emitted while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Stage {
        stage: Stage,
    },
    /// About to invoke the generator.
    Attempt {
        description: String,
        attempt: u32,
        max_attempts: u32,
    },
    Present {
        path: PathBuf,
    },
    Generated {
        path: PathBuf,
        attempts: u32,
    },
    TimedOut {
        path: PathBuf,
        attempts: u32,
    },
    Note {
        message: String,
    },
}

pub trait ProgressReporter {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Human-facing progress on stdout. Diagnostics go through `tracing`.
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Stage { stage } => println!("==> {}", stage),
            ProgressEvent::Attempt {
                description,
                attempt,
                max_attempts,
            } => {
                if attempt == 1 {
                    println!("{}", description);
                } else {
                    println!("{} (attempt {}/{})", description, attempt, max_attempts);
                }
            }
            ProgressEvent::Present { path } => {
                println!("    already present: {}", path.display());
            }
            ProgressEvent::Generated { path, attempts } => {
                println!("    generated {} after {} attempt(s)", path.display(), attempts);
            }
            ProgressEvent::TimedOut { path, attempts } => {
                println!(
                    "    WARNING: {} was not created after {} attempts, moving on",
                    path.display(),
                    attempts
                );
            }
            ProgressEvent::Note { message } => println!("    {}", message),
        }
    }
}
