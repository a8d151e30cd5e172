//! Prelude module for common imports

pub use crate::config::{DeployConfig, Deployment, DeploymentPlan, Server};
pub use crate::executor::{
    CommandStatus, Executor, ProcessRunner, RawCompletion, RawSession, RemoteChannel,
    ShellRunner, Target,
};
pub use crate::pipeline::{
    Command, CommandKind, ExecutionError, ExecutionOutcome, Pipeline, PipelineReport,
    StepFailure, TransportError, Validate, ValidationError,
};
pub use crate::plan::{Connector, PlanFilter, PlanRecord, PlanRunner, PlanSummary};
pub use crate::ssh::{SshConnector, SshOptions};
