//! Core types for pipeline domain
//!
//! This module contains the results a pipeline run produces.

#![allow(clippy::must_use_candidate)]

use super::command::Command;
use super::errors::ExecutionError;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Result of running a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The command that ran
    pub command: Command,
    /// True if the pipeline may continue after this command
    pub succeeded: bool,
    /// True if the command failed but the failure was classified ignorable
    pub ignored_error: bool,
    /// Wall time spent on the command
    pub duration: Duration,
    /// Failure description, present for failed and ignored commands
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub(crate) fn success(command: &Command, duration: Duration) -> Self {
        Self {
            command: command.clone(),
            succeeded: true,
            ignored_error: false,
            duration,
            error: None,
        }
    }

    pub(crate) fn ignored(command: &Command, duration: Duration, error: String) -> Self {
        Self {
            command: command.clone(),
            succeeded: true,
            ignored_error: true,
            duration,
            error: Some(error),
        }
    }

    pub(crate) fn failure(command: &Command, duration: Duration, error: &ExecutionError) -> Self {
        Self {
            command: command.clone(),
            succeeded: false,
            ignored_error: false,
            duration,
            error: Some(error.to_string()),
        }
    }
}

/// The failure that stopped a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// 1-based index of the failing command
    pub step: usize,
    /// What went wrong
    pub error: ExecutionError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}: {}", self.step, self.error)
    }
}

impl std::error::Error for StepFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result of running a whole pipeline
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Identifier correlating the log events of this run
    pub run_id: Uuid,
    /// One outcome per attempted command, in execution order
    pub outcomes: Vec<ExecutionOutcome>,
    /// True if every attempted command succeeded or was ignored
    pub succeeded: bool,
    /// Wall time of the whole run
    pub total_duration: Duration,
    /// The fatal failure, if the run stopped early
    pub failure: Option<StepFailure>,
}

impl PipelineReport {
    /// Number of commands that were attempted
    pub fn steps(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of commands whose failure was ignored
    pub fn ignored_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ignored_error).count()
    }

    /// Converts the report into a `Result`, keeping the failure as the error
    ///
    /// # Errors
    ///
    /// Returns the [`StepFailure`] that stopped the run.
    pub fn into_result(self) -> Result<Self, StepFailure> {
        match self.failure.clone() {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
