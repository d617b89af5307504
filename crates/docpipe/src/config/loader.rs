use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, ConfigFormat::from_path(path))
}

pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if config.generator.program.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "generator.program must not be empty".to_string(),
        });
    }

    if config.task_tracker.enabled && config.task_tracker.program.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "task_tracker.program must not be empty when enabled".to_string(),
        });
    }

    if config.outputs.prd_prefix.is_empty() {
        return Err(ConfigError::Validation {
            message: "outputs.prd_prefix must not be empty".to_string(),
        });
    }

    if config.reports.journeys_section.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "reports.journeys_section must not be empty".to_string(),
        });
    }

    for section in &config.assembly.extra_sections {
        if !(1..=6).contains(&section.new_level) {
            return Err(ConfigError::Validation {
                message: format!(
                    "assembly section '{}' has heading level {}, expected 1-6",
                    section.header, section.new_level
                ),
            });
        }
    }

    Ok(())
}
