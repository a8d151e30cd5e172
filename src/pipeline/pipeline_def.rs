//! Pipeline definition

#![allow(clippy::must_use_candidate)]

use crate::pipeline::command::Command;
use crate::pipeline::errors::ValidationError;
use crate::pipeline::types::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of commands executed for one deployment target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Commands, run strictly in order
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Validate for Pipeline {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.commands.is_empty() {
            return Err(ValidationError::EmptyPipeline);
        }

        for (i, command) in self.commands.iter().enumerate() {
            let index = i + 1;
            match command {
                Command::Local { command: text, .. } | Command::Remote { command: text }
                    if text.trim().is_empty() =>
                {
                    return Err(ValidationError::EmptyCommand {
                        index,
                        kind: command.kind_label().to_string(),
                    });
                }
                Command::Transfer {
                    local_path,
                    remote_path,
                } if local_path.as_os_str().is_empty() || remote_path.is_empty() => {
                    return Err(ValidationError::EmptyTransferPath { index });
                }
                // Unknown kinds are rejected by the executor when reached.
                _ => {}
            }
        }

        Ok(())
    }
}

impl Pipeline {
    /// Creates a pipeline from commands
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Returns number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if the pipeline has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands whose kind tag is not supported
    pub fn unrecognized(&self) -> impl Iterator<Item = (usize, &str)> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind().is_none())
            .map(|(i, c)| (i + 1, c.kind_label()))
    }
}

impl FromIterator<Command> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline: {} commands", self.commands.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_validation_empty() {
        let result = Pipeline::default().validate();

        assert_eq!(result, Err(ValidationError::EmptyPipeline));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Pipeline must have at least one command"
        );
    }

    #[test]
    fn test_pipeline_validation_blank_command() {
        let pipeline = Pipeline::new(vec![Command::local("echo ok"), Command::remote("  ")]);

        assert_eq!(
            pipeline.validate(),
            Err(ValidationError::EmptyCommand {
                index: 2,
                kind: "remote".to_string()
            })
        );
    }

    #[test]
    fn test_pipeline_validation_transfer_paths() {
        let pipeline = Pipeline::new(vec![Command::transfer("bin/app", "")]);

        assert_eq!(
            pipeline.validate(),
            Err(ValidationError::EmptyTransferPath { index: 1 })
        );
    }

    #[test]
    fn test_pipeline_validation_allows_unknown_kind() {
        let pipeline = Pipeline::new(vec![
            Command::local("echo ok"),
            Command::Unrecognized {
                kind: "ftp".to_string(),
            },
        ]);

        assert!(pipeline.validate().is_ok());
        assert_eq!(pipeline.unrecognized().collect::<Vec<_>>(), vec![(2, "ftp")]);
    }

    #[test]
    fn test_pipeline_from_yaml() {
        let yaml = r"
commands:
  - type: local
    command: make
  - type: remote
    command: systemctl restart app
";
        let pipeline: Pipeline = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.to_string(), "Pipeline: 2 commands");
        assert!(pipeline.validate().is_ok());
    }
}
