//! # quickdeploy - configuration-driven deployments over SSH
//!
//! A deployment is a pipeline of commands run strictly in order against one
//! server: local shell commands, remote shell commands and single-file
//! transfers. The first failure stops the pipeline, except for failures of
//! commands whose text marks them as "already in the desired state" (`kill`,
//! `pkill`, `rm -f`, `systemctl stop`), which are recorded and skipped over.
//!
//! ## Layout
//!
//! - [`pipeline`]: commands, pipelines, outcomes and errors
//! - [`executor`]: runs one pipeline against one connected server
//! - [`ssh`]: the system `ssh` client as a [`RemoteChannel`]
//! - [`plan`]: runs every configured (server, deployment) pair
//! - [`config`]: YAML configuration loading and validation
//! - [`infrastructure`]: runner settings and logging
//!
//! ## Example
//!
//! ```no_run
//! use quickdeploy::prelude::*;
//!
//! let config = DeployConfig::load("deploy.yaml")?;
//! let connector = SshConnector::new(SshOptions::from(&config.settings));
//! let summary = PlanRunner::new().run(&config, &connector, &mut std::io::stdout());
//! assert!(summary.all_succeeded());
//! # Ok::<(), quickdeploy::config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod executor;
pub mod infrastructure;
pub mod pipeline;
pub mod plan;
pub mod ssh;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use config::{ConfigError, DeployConfig, Deployment, DeploymentPlan, Server};
pub use executor::{Executor, ProcessRunner, RemoteChannel, ShellRunner, Target, is_ignorable};
pub use infrastructure::{Settings, init_logging};
pub use pipeline::{
    Command, CommandKind, ExecutionError, ExecutionOutcome, Pipeline, PipelineReport,
    TransportError, Validate, ValidationError,
};
pub use plan::{Connector, PlanFilter, PlanRunner, PlanSummary};
pub use ssh::{SshChannel, SshConnector, SshOptions};

/// Version of the quickdeploy crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
