//! Pipeline domain types
//!
//! Commands and pipelines are plain data loaded from configuration; they are
//! immutable once constructed and borrowed by the executor for a run.

pub mod command;
pub mod errors;
pub mod pipeline_def;
pub mod types;

#[cfg(test)]
mod types_tests;

pub use command::{Command, CommandKind};
pub use errors::{ExecutionError, TransportError, ValidationError};
pub use pipeline_def::Pipeline;
pub use types::{ExecutionOutcome, PipelineReport, StepFailure, Validate};
