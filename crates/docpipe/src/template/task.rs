use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::TemplateError;

use super::registry::{DocKind, DocSpec};

/// Key every template uses for the file the generator must write.
pub const TARGET_KEY: &str = "absolute_file_path";

/// One rendered prompt and the file whose existence marks it done.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub kind: DocKind,
    pub prompt: String,
    pub target_path: PathBuf,
    pub description: String,
}

impl GenerationTask {
    /// Render `spec` with `target_path` bound to [`TARGET_KEY`], so the path the
    /// prompt asks for and the path that gets checked are always the same.
    pub fn new(
        spec: &DocSpec,
        mut substitutions: HashMap<String, String>,
        target_path: impl Into<PathBuf>,
        description: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let target_path = target_path.into();
        substitutions.insert(TARGET_KEY.to_string(), path_string(&target_path));

        Ok(Self {
            kind: spec.kind,
            prompt: spec.render(&substitutions)?,
            target_path,
            description: description.into(),
        })
    }
}

pub(crate) fn path_string(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_bound_into_prompt() {
        let spec = DocSpec::new(DocKind::ApiPlan, "Plan $api into $absolute_file_path");
        let subs = HashMap::from([
            ("api".to_string(), "/docs/api.md".to_string()),
            (TARGET_KEY.to_string(), "/somewhere/else.md".to_string()),
        ]);

        let task = GenerationTask::new(&spec, subs, "/docs/plan.md", "Generating plan").unwrap();

        assert_eq!(task.prompt, "Plan /docs/api.md into /docs/plan.md");
        assert_eq!(task.target_path, PathBuf::from("/docs/plan.md"));
        assert_eq!(task.kind, DocKind::ApiPlan);
    }

    #[test]
    fn test_missing_key_propagates() {
        let spec = DocSpec::new(DocKind::Brd, "BRD for $journey at $absolute_file_path");
        let result = GenerationTask::new(&spec, HashMap::new(), "/docs/brd.md", "brd");
        assert!(matches!(result, Err(TemplateError::MissingKey { .. })));
    }
}
