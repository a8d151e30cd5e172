//! Configuration loading errors.

use crate::pipeline::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or validating a deployment configuration
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("no servers defined in configuration")]
    NoServers,

    #[error("server name cannot be empty")]
    EmptyServerName,

    #[error("deployment name cannot be empty")]
    EmptyDeploymentName,

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid value for {field} of server {server}: {message}")]
    InvalidServer {
        server: String,
        field: &'static str,
        message: String,
    },

    #[error("invalid pipeline for deployment {deployment}: {source}")]
    InvalidPipeline {
        deployment: String,
        #[source]
        source: ValidationError,
    },

    #[error("{kind} '{name}' in deploy plan not found in {kind} definitions")]
    InvalidReference { kind: &'static str, name: String },
}

/// Result alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
