//! Retry-until-artifact generation.
//!
//! The external generator is stateless and unreliable, so the only success
//! signal is the target file existing. Existence is checked before every
//! invocation, which also makes a finished task a no-op on re-runs.

pub mod backoff;
pub mod generator;
pub mod probe;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pipeline::progress::{ProgressEvent, ProgressReporter};
use crate::template::GenerationTask;

pub use backoff::{BackoffPolicy, BackoffStrategy, RetryPolicy};
pub use generator::{CommandGenerator, Generator, GeneratorError};
pub use probe::{ArtifactProbe, FsProbe, Sleeper, ThreadSleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The file existed before any invocation.
    AlreadyPresent,
    Generated { attempts: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{}' still missing after {attempts} attempts", .target.display())]
pub struct GenerationTimeout {
    pub target: PathBuf,
    pub attempts: u32,
}

pub struct Orchestrator {
    generator: Box<dyn Generator>,
    probe: Box<dyn ArtifactProbe>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Orchestrator {
    /// Production orchestrator: real filesystem and real sleeps.
    pub fn new(generator: Box<dyn Generator>, policy: RetryPolicy) -> Self {
        Self::with_parts(generator, Box::new(FsProbe), Box::new(ThreadSleeper), policy)
    }

    pub fn with_parts(
        generator: Box<dyn Generator>,
        probe: Box<dyn ArtifactProbe>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            probe,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invoke the generator until `task.target_path` exists or the attempt
    /// budget runs out. Generator errors are logged and retried.
    pub fn ensure_generated(
        &self,
        task: &GenerationTask,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationOutcome, GenerationTimeout> {
        let target = &task.target_path;
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            if self.probe.exists(target) {
                return Ok(self.finish(task, attempt, progress));
            }

            let delay = self.policy.backoff.delay_for(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                self.sleeper.sleep(delay);
            }

            progress.report(ProgressEvent::Attempt {
                description: task.description.clone(),
                attempt: attempt + 1,
                max_attempts,
            });

            match self.generator.generate(&task.prompt) {
                Ok(()) => debug!(path = %target.display(), attempt, "Generator exited cleanly"),
                Err(e) => warn!(path = %target.display(), attempt, "Generator failed: {}", e),
            }
        }

        if self.probe.exists(target) {
            return Ok(self.finish(task, max_attempts, progress));
        }

        progress.report(ProgressEvent::TimedOut {
            path: target.clone(),
            attempts: max_attempts,
        });
        Err(GenerationTimeout {
            target: target.clone(),
            attempts: max_attempts,
        })
    }

    fn finish(
        &self,
        task: &GenerationTask,
        invocations: u32,
        progress: &dyn ProgressReporter,
    ) -> GenerationOutcome {
        let path = task.target_path.clone();
        if invocations == 0 {
            debug!(path = %path.display(), "Already generated, skipping");
            progress.report(ProgressEvent::Present { path });
            GenerationOutcome::AlreadyPresent
        } else {
            info!(path = %path.display(), attempts = invocations, "Generated");
            progress.report(ProgressEvent::Generated {
                path,
                attempts: invocations,
            });
            GenerationOutcome::Generated {
                attempts: invocations,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;
    use std::time::Duration;

    use crate::pipeline::progress::NoopProgress;
    use crate::template::{DocKind, DocSpec};

    /// Creates the target on the `succeed_on`-th call (1-based), never if None.
    struct StubGenerator {
        target: PathBuf,
        succeed_on: Option<u32>,
        calls: Rc<Cell<u32>>,
        fail_exit: bool,
    }

    impl Generator for StubGenerator {
        fn generate(&self, _prompt: &str) -> Result<(), GeneratorError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if self.succeed_on == Some(call) {
                std::fs::write(&self.target, "# done\n").unwrap();
            }
            if self.fail_exit {
                return Err(GeneratorError::NonZeroExit {
                    program: "stub".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "rate limited".to_string(),
                });
            }
            Ok(())
        }
    }

    struct RecordingSleeper(Rc<RefCell<Vec<Duration>>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        target: PathBuf,
        calls: Rc<Cell<u32>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.md");
        Fixture {
            _dir: dir,
            target,
            calls: Rc::new(Cell::new(0)),
            sleeps: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn orchestrator(f: &Fixture, succeed_on: Option<u32>, fail_exit: bool, max: u32) -> Orchestrator {
        Orchestrator::with_parts(
            Box::new(StubGenerator {
                target: f.target.clone(),
                succeed_on,
                calls: f.calls.clone(),
                fail_exit,
            }),
            Box::new(FsProbe),
            Box::new(RecordingSleeper(f.sleeps.clone())),
            RetryPolicy {
                max_attempts: max,
                backoff: BackoffPolicy::Linear(Duration::from_secs(1)),
            },
        )
    }

    fn task(target: &Path) -> GenerationTask {
        let spec = DocSpec::new(DocKind::ApiPlan, "write $absolute_file_path");
        GenerationTask::new(&spec, Default::default(), target, "Generating plan").unwrap()
    }

    #[test]
    fn test_existing_file_is_noop() {
        let f = fixture();
        std::fs::write(&f.target, "already").unwrap();
        let orch = orchestrator(&f, Some(1), false, 3);

        let outcome = orch.ensure_generated(&task(&f.target), &NoopProgress).unwrap();

        assert_eq!(outcome, GenerationOutcome::AlreadyPresent);
        assert_eq!(f.calls.get(), 0);
        assert!(f.sleeps.borrow().is_empty());
    }

    #[test]
    fn test_success_on_third_attempt() {
        let f = fixture();
        let orch = orchestrator(&f, Some(3), false, 3);

        let outcome = orch.ensure_generated(&task(&f.target), &NoopProgress).unwrap();

        assert_eq!(outcome, GenerationOutcome::Generated { attempts: 3 });
        assert_eq!(f.calls.get(), 3);
    }

    #[test]
    fn test_timeout_after_budget() {
        let f = fixture();
        let orch = orchestrator(&f, None, false, 3);

        let err = orch.ensure_generated(&task(&f.target), &NoopProgress).unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.target, f.target);
        assert_eq!(f.calls.get(), 3);
    }

    #[test]
    fn test_linear_backoff_between_attempts() {
        let f = fixture();
        let orch = orchestrator(&f, None, false, 3);

        let _ = orch.ensure_generated(&task(&f.target), &NoopProgress);

        assert_eq!(
            *f.sleeps.borrow(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_non_zero_exit_with_file_is_success() {
        let f = fixture();
        let orch = orchestrator(&f, Some(1), true, 3);

        let outcome = orch.ensure_generated(&task(&f.target), &NoopProgress).unwrap();

        assert_eq!(outcome, GenerationOutcome::Generated { attempts: 1 });
        assert_eq!(f.calls.get(), 1);
    }

    #[test]
    fn test_non_zero_exit_keeps_retrying() {
        let f = fixture();
        let orch = orchestrator(&f, Some(2), true, 5);

        let outcome = orch.ensure_generated(&task(&f.target), &NoopProgress).unwrap();

        assert_eq!(outcome, GenerationOutcome::Generated { attempts: 2 });
        assert_eq!(f.calls.get(), 2);
    }
}
