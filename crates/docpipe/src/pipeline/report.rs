use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::orchestrator::{GenerationOutcome, GenerationTimeout};

use super::error::PipelineError;
use super::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The target existed before the step ran.
    Skipped,
    Generated { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl From<&Result<GenerationOutcome, GenerationTimeout>> for StepOutcome {
    fn from(result: &Result<GenerationOutcome, GenerationTimeout>) -> Self {
        match result {
            Ok(GenerationOutcome::AlreadyPresent) => StepOutcome::Skipped,
            Ok(GenerationOutcome::Generated { attempts }) => StepOutcome::Generated {
                attempts: *attempts,
            },
            Err(timeout) => StepOutcome::TimedOut {
                attempts: timeout.attempts,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub stage: Stage,
    pub target: PathBuf,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// What one `run` did, persisted as JSON after the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| predicate(&s.outcome)).count()
    }

    pub fn timed_out(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::TimedOut { .. }))
    }

    pub fn write(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_json_shape() {
        let record = StepRecord {
            stage: Stage::ApiPlan,
            target: PathBuf::from("/docs/api_design/api_plan.md"),
            outcome: StepOutcome::TimedOut { attempts: 5 },
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["stage"], "api-plan");
        assert_eq!(value["outcome"], "timed_out");
        assert_eq!(value["attempts"], 5);
    }

    #[test]
    fn test_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".docpipe").join("last_run.json");

        let mut report = RunReport::start();
        report.steps.push(StepRecord {
            stage: Stage::Prd,
            target: PathBuf::from("/docs/prds/prd_phase_1.md"),
            outcome: StepOutcome::Generated { attempts: 2 },
        });
        report.finish();
        report.write(&path).unwrap();

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.steps, report.steps);
        assert!(loaded.finished_at.is_some());
    }
}
