use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::TemplateError;

use super::render::{placeholders, render_template};
use super::task::TARGET_KEY;

/// The document types the pipeline knows how to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    UserJourney,
    Brd,
    FunctionalSpecIntro,
    DatabaseDefinition,
    DatabaseErd,
    ApiDefinition,
    ApiDependencies,
    ApiPlan,
    ApiDetailDesign,
    Prd,
}

impl DocKind {
    pub const ALL: [DocKind; 10] = [
        DocKind::UserJourney,
        DocKind::Brd,
        DocKind::FunctionalSpecIntro,
        DocKind::DatabaseDefinition,
        DocKind::DatabaseErd,
        DocKind::ApiDefinition,
        DocKind::ApiDependencies,
        DocKind::ApiPlan,
        DocKind::ApiDetailDesign,
        DocKind::Prd,
    ];

    /// Template name, also the file stem looked up in an override directory.
    pub fn name(self) -> &'static str {
        match self {
            DocKind::UserJourney => "user_journey",
            DocKind::Brd => "brd",
            DocKind::FunctionalSpecIntro => "functional_spec_intro",
            DocKind::DatabaseDefinition => "database_definition",
            DocKind::DatabaseErd => "database_erd",
            DocKind::ApiDefinition => "api_definition",
            DocKind::ApiDependencies => "api_dependencies",
            DocKind::ApiPlan => "api_plan",
            DocKind::ApiDetailDesign => "api_detail_design",
            DocKind::Prd => "prd",
        }
    }

    fn builtin_template(self) -> &'static str {
        match self {
            DocKind::UserJourney => include_str!("../../templates/user_journey.md"),
            DocKind::Brd => include_str!("../../templates/brd.md"),
            DocKind::FunctionalSpecIntro => include_str!("../../templates/functional_spec_intro.md"),
            DocKind::DatabaseDefinition => include_str!("../../templates/database_definition.md"),
            DocKind::DatabaseErd => include_str!("../../templates/database_erd.md"),
            DocKind::ApiDefinition => include_str!("../../templates/api_definition.md"),
            DocKind::ApiDependencies => include_str!("../../templates/api_dependencies.md"),
            DocKind::ApiPlan => include_str!("../../templates/api_plan.md"),
            DocKind::ApiDetailDesign => include_str!("../../templates/api_detail_design.md"),
            DocKind::Prd => include_str!("../../templates/prd.md"),
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        DocKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| TemplateError::UnknownTemplate(s.to_string()))
    }
}

/// A prompt template together with the keys it needs.
#[derive(Debug, Clone)]
pub struct DocSpec {
    pub kind: DocKind,
    pub template: String,
    pub required_keys: BTreeSet<String>,
}

impl DocSpec {
    pub fn new(kind: DocKind, template: impl Into<String>) -> Self {
        let template = template.into();
        let required_keys = placeholders(&template);
        Self {
            kind,
            template,
            required_keys,
        }
    }

    pub fn render(&self, substitutions: &HashMap<String, String>) -> Result<String, TemplateError> {
        render_template(self.kind.name(), &self.template, substitutions)
    }
}

/// Every [`DocSpec`] the pipeline uses, built once and passed around.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    specs: HashMap<DocKind, DocSpec>,
}

impl TemplateRegistry {
    /// Registry containing only the templates compiled into the binary.
    pub fn builtin() -> Self {
        let specs = DocKind::ALL
            .into_iter()
            .map(|kind| (kind, DocSpec::new(kind, kind.builtin_template())))
            .collect();
        Self { specs }
    }

    /// Built-in templates, replaced by `<name>.md` from `overrides` where present.
    pub fn load(overrides: Option<&Path>) -> Result<Self, TemplateError> {
        let mut registry = Self::builtin();

        let Some(dir) = overrides else {
            return Ok(registry);
        };

        for kind in DocKind::ALL {
            let path = dir.join(format!("{}.md", kind.name()));
            if !path.is_file() {
                continue;
            }
            let template =
                std::fs::read_to_string(&path).map_err(|e| TemplateError::ReadOverride {
                    path: path.clone(),
                    source: e,
                })?;
            let spec = DocSpec::new(kind, template);
            // The orchestrator polls for the path the prompt names.
            if !spec.required_keys.contains(TARGET_KEY) {
                return Err(TemplateError::MissingTargetPlaceholder {
                    template: kind.name(),
                    target_key: TARGET_KEY,
                    path,
                });
            }
            debug!(template = kind.name(), path = %path.display(), "Loaded template override");
            registry.specs.insert(kind, spec);
        }

        info!("Loaded {} templates", registry.specs.len());
        Ok(registry)
    }

    pub fn get(&self, kind: DocKind) -> &DocSpec {
        // Both constructors populate every kind.
        &self.specs[&kind]
    }

    pub fn render(
        &self,
        kind: DocKind,
        substitutions: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        self.get(kind).render(substitutions)
    }
}
