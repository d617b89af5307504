//! Test harness for isolated pipeline runs.
//!
//! `TestHarness` owns a temporary working directory laid out the way the
//! default config expects, and builds a `Pipeline` whose external CLIs are
//! replaced by in-process fakes that record what they were asked to do.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tempfile::TempDir;

use docpipe::config::Config;
use docpipe::error::TaskError;
use docpipe::orchestrator::{
    BackoffPolicy, FsProbe, Generator, GeneratorError, Orchestrator, RetryPolicy, Sleeper,
};
use docpipe::pipeline::{Pipeline, PipelineConfig, ProgressEvent, ProgressReporter};
use docpipe::tasks::TaskTracker;
use docpipe::template::TemplateRegistry;

static RE_MD_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\S*\.md").unwrap());

/// A report with two journeys, a grandchild header, and a later section whose
/// children must not count as journeys.
pub const JOURNEY_REPORT: &str = "\
# Detailed Journeys

Overview text.

## User Journeys

### Journey A

Sign up and create a book.

### Journey B

#### Step details

Record a transaction.

## Appendix

### Not A Journey
";

/// Writes the last absolute `.md` path named in each prompt, which is where
/// every template asks for its output.
pub struct FakeGenerator {
    pub prompts: Rc<RefCell<Vec<String>>>,
    /// File names this generator never manages to write.
    pub never_writes: HashSet<String>,
}

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str) -> Result<(), GeneratorError> {
        self.prompts.borrow_mut().push(prompt.to_string());

        let Some(target) = RE_MD_PATH.find_iter(prompt).last() else {
            return Err(GeneratorError::NonZeroExit {
                program: "fake".to_string(),
                status: "exit status: 2".to_string(),
                stderr: "no output path in prompt".to_string(),
            });
        };
        let target = Path::new(target.as_str());

        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.never_writes.contains(name) {
            return Err(GeneratorError::NonZeroExit {
                program: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "quota exceeded".to_string(),
            });
        }

        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, format!("# Generated {}\n", name)).unwrap();
        Ok(())
    }
}

pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

pub struct RecordingTracker {
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl TaskTracker for RecordingTracker {
    fn parse_prd(&self, prd: &Path) -> Result<(), TaskError> {
        self.calls
            .borrow_mut()
            .push(format!("parse-prd {}", prd.display()));
        Ok(())
    }

    fn expand_all(&self) -> Result<(), TaskError> {
        self.calls.borrow_mut().push("expand".to_string());
        Ok(())
    }
}

pub struct RecordingProgress {
    pub events: Rc<RefCell<Vec<ProgressEvent>>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub layout: Arc<PipelineConfig>,
    pub prompts: Rc<RefCell<Vec<String>>>,
    pub tracker_calls: Rc<RefCell<Vec<String>>>,
    pub events: Rc<RefCell<Vec<ProgressEvent>>>,
    pub max_attempts: u32,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let layout = PipelineConfig::from_config(&config, temp_dir.path())
            .expect("Failed to resolve layout");

        Self {
            temp_dir,
            layout: Arc::new(layout),
            prompts: Rc::new(RefCell::new(Vec::new())),
            tracker_calls: Rc::new(RefCell::new(Vec::new())),
            events: Rc::new(RefCell::new(Vec::new())),
            max_attempts: 3,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `path`, creating parents.
    pub fn write(&self, path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    pub fn write_journey_report(&self) {
        self.write(&self.layout.detailed_journeys_report, JOURNEY_REPORT);
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_never_writing(&[])
    }

    /// Pipeline whose generator fails to produce the named files.
    pub fn pipeline_never_writing(&self, file_names: &[&str]) -> Pipeline {
        let generator = FakeGenerator {
            prompts: self.prompts.clone(),
            never_writes: file_names.iter().map(|s| s.to_string()).collect(),
        };
        let orchestrator = Orchestrator::with_parts(
            Box::new(generator),
            Box::new(FsProbe),
            Box::new(NoSleep),
            RetryPolicy {
                max_attempts: self.max_attempts,
                backoff: BackoffPolicy::Linear(Duration::from_secs(5)),
            },
        );
        let tracker = RecordingTracker {
            calls: self.tracker_calls.clone(),
        };

        Pipeline::new(
            self.layout.clone(),
            TemplateRegistry::builtin(),
            orchestrator,
            Box::new(tracker),
        )
    }

    pub fn progress(&self) -> RecordingProgress {
        RecordingProgress {
            events: self.events.clone(),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.borrow().len()
    }

    pub fn prd_path(&self, phase: u32) -> PathBuf {
        self.layout
            .prds_directory
            .join(self.layout.prd_pattern.file_name(phase))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
