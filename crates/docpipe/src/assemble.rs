//! Final functional specification: the introduction, selected report
//! sections, then every user journey in file-name order.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::markdown::extract_section;
use crate::pipeline::{PipelineConfig, PipelineError, SectionSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub output: PathBuf,
    pub sections: usize,
    pub journeys: usize,
}

/// Rewrite `config.functional_spec` from its parts.
pub fn assemble_functional_spec(config: &PipelineConfig) -> Result<Assembly, PipelineError> {
    let mut document = read(&config.functional_spec_intro)?;

    for section in &config.extra_sections {
        push_part(&mut document, &section_text(section)?);
    }

    let journeys = journey_files(&config.user_journeys_directory);
    for journey in &journeys {
        debug!(path = %journey.display(), "Adding journey");
        push_part(&mut document, &read(journey)?);
    }

    let output = &config.functional_spec;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(output, document).map_err(|e| StorageError::WriteFile {
        path: output.clone(),
        source: e,
    })?;

    info!(
        path = %output.display(),
        sections = config.extra_sections.len(),
        journeys = journeys.len(),
        "Assembled functional specification"
    );

    Ok(Assembly {
        output: output.clone(),
        sections: config.extra_sections.len(),
        journeys: journeys.len(),
    })
}

fn section_text(section: &SectionSource) -> Result<String, PipelineError> {
    let source = read(&section.source)?;
    Ok(extract_section(&source, &section.header, section.new_level)?)
}

/// Files directly inside `directory`, sorted by name. Missing directory: none.
fn journey_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn push_part(document: &mut String, part: &str) {
    if !document.is_empty() && !document.ends_with('\n') {
        document.push('\n');
    }
    document.push_str(part);
}

fn read(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingInput(path.to_path_buf())
        } else {
            StorageError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            }
            .into()
        }
    })
}
