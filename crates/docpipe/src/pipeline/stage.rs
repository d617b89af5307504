use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One step of the documentation pipeline, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    UserJourneys,
    Brds,
    FunctionalSpecIntro,
    DatabaseDefinition,
    DatabaseErd,
    ApiDefinition,
    ApiDependencies,
    ApiPlan,
    ApiDetailDesign,
    Prd,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::UserJourneys,
        Stage::Brds,
        Stage::FunctionalSpecIntro,
        Stage::DatabaseDefinition,
        Stage::DatabaseErd,
        Stage::ApiDefinition,
        Stage::ApiDependencies,
        Stage::ApiPlan,
        Stage::ApiDetailDesign,
        Stage::Prd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::UserJourneys => "user-journeys",
            Stage::Brds => "brds",
            Stage::FunctionalSpecIntro => "functional-spec-intro",
            Stage::DatabaseDefinition => "database-definition",
            Stage::DatabaseErd => "database-erd",
            Stage::ApiDefinition => "api-definition",
            Stage::ApiDependencies => "api-dependencies",
            Stage::ApiPlan => "api-plan",
            Stage::ApiDetailDesign => "api-detail-design",
            Stage::Prd => "prd",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "-");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
                format!("unknown stage '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
