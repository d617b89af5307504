use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// A non-zero exit or launch failure of the generation process. Advisory
/// only: whether the target file exists is what decides success.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Something that turns a prompt into (possibly) a file on disk.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<(), GeneratorError>;
}

/// Runs an external AI CLI as `<program> <args...> <prompt>` and waits for it.
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_directory: None,
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    fn command(&self, prompt: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(prompt);
        if let Some(ref dir) = self.working_directory {
            command.current_dir(dir);
        }
        command
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<(), GeneratorError> {
        let output = self
            .command(prompt)
            .output()
            .map_err(|e| GeneratorError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(program = %self.program, "{}", stdout.trim_end());
        }

        if !output.status.success() {
            return Err(GeneratorError::NonZeroExit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_passed_as_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.md");
        // sh -c '<script>' <$0> <$1=prompt>
        let generator = CommandGenerator::new(
            "sh",
            vec![
                "-c".to_string(),
                format!("printf '%s' \"$1\" > {}", target.display()),
                "sh".to_string(),
            ],
        );

        generator.generate("hello prompt").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello prompt");
    }

    #[test]
    fn test_non_zero_exit_reported() {
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string(), "sh".to_string()],
        );

        match generator.generate("ignored") {
            Err(GeneratorError::NonZeroExit { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("Expected NonZeroExit, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let generator = CommandGenerator::new("definitely-not-a-real-binary-docpipe", vec![]);
        assert!(matches!(
            generator.generate("x"),
            Err(GeneratorError::Spawn { .. })
        ));
    }

    #[test]
    fn test_working_directory_applied() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".to_string(), "touch created.md".to_string(), "sh".to_string()],
        )
        .with_working_directory(dir.path());

        generator.generate("x").unwrap();

        assert!(dir.path().join("created.md").exists());
    }
}
