//! Phase numbering for `prefix_<N>.suffix` file series.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePattern {
    prefix: String,
    suffix: String,
}

impl PhasePattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Phase number encoded in `file_name`, if it follows the pattern.
    pub fn parse(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(&self.prefix)?
            .strip_suffix(&self.suffix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn file_name(&self, phase: u32) -> String {
        format!("{}{}{}", self.prefix, phase, self.suffix)
    }
}

impl Default for PhasePattern {
    fn default() -> Self {
        Self::new("prd_phase_", ".md")
    }
}

/// Phase numbers present in `directory`. A missing or unreadable directory
/// has none; non-conforming names are skipped.
pub fn present_phases(directory: &Path, pattern: &PhasePattern) -> BTreeSet<u32> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.file_name().to_str().and_then(|name| pattern.parse(name)))
        .collect()
}

/// The first gap in `1..=latest`, or `latest + 1` when there is none.
/// Returns 1 for an empty or missing directory.
pub fn next_phase(directory: &Path, pattern: &PhasePattern) -> u32 {
    let present = present_phases(directory, pattern);

    let Some(&latest) = present.last() else {
        debug!(directory = %directory.display(), "No phase files found");
        return 1;
    };

    let next = (1..=latest)
        .find(|n| !present.contains(n))
        .unwrap_or(latest + 1);

    debug!(latest, next, "Computed next phase");
    next
}
