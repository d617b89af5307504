use std::path::PathBuf;

use super::report::RunReport;

pub struct PipelineContext {
    // user-journeys result, or the planned paths when that stage is not selected
    pub journey_files: Option<Vec<PathBuf>>,

    pub report: RunReport,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self {
            journey_files: None,
            report: RunReport::start(),
        }
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}
