//! Deployment configuration
//!
//! A configuration file names the servers, the deployments (each a pipeline)
//! and the plans pairing a server with a deployment:
//!
//! ```yaml
//! servers:
//!   - name: web-1
//!     host: 10.0.0.5
//!     username: deploy
//! deployments:
//!   - name: app
//!     pipeline:
//!       commands:
//!         - type: local
//!           command: make build
//!         - type: scp
//!           local_path: target/app
//!           remote_path: /srv/app/bin/app
//!         - type: remote
//!           command: systemctl restart app
//! deploy_plans:
//!   - server: web-1
//!     deployment: app
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::executor::Target;
use crate::infrastructure::Settings;
use crate::pipeline::{Pipeline, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "deploy.yaml";

/// A remote server deployments run against
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Unique name referenced by deploy plans
    pub name: String,
    /// Host name, address or ssh config alias
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user
    pub username: String,
    /// Password, when key authentication is not available
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Private key passed to ssh with `-i`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

fn default_port() -> u16 {
    22
}

impl Server {
    /// Returns the password if one is configured and non-empty
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password().map(|_| "<redacted>"))
            .field("identity_file", &self.identity_file)
            .finish()
    }
}

impl From<&Server> for Target {
    fn from(server: &Server) -> Self {
        Self {
            name: server.name.clone(),
            host: server.host.clone(),
            port: server.port,
            username: server.username.clone(),
        }
    }
}

/// A named pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique name referenced by deploy plans
    pub name: String,
    /// Commands to run
    pub pipeline: Pipeline,
}

/// Pairs a server with a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Server name
    pub server: String,
    /// Deployment name
    pub deployment: String,
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Runner settings
    #[serde(default)]
    pub settings: Settings,
    /// Known servers
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Known deployments
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    /// Plans, executed in order
    #[serde(default)]
    pub deploy_plans: Vec<DeploymentPlan>,
}

impl DeployConfig {
    /// Loads and validates a configuration file
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration");

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&data)
    }

    /// Parses and validates configuration text
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text cannot be parsed or validated.
    pub fn from_yaml(data: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Looks up a server by name
    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Looks up a deployment by name
    pub fn deployment(&self, name: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.name == name)
    }
}

impl Validate for DeployConfig {
    type Error = ConfigError;

    fn validate(&self) -> ConfigResult<()> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let mut server_names = HashSet::new();
        for server in &self.servers {
            if server.name.is_empty() {
                return Err(ConfigError::EmptyServerName);
            }
            if !server_names.insert(server.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "server",
                    name: server.name.clone(),
                });
            }
            let invalid = |field, message: &str| ConfigError::InvalidServer {
                server: server.name.clone(),
                field,
                message: message.to_string(),
            };
            if server.host.is_empty() {
                return Err(invalid("host", "cannot be empty"));
            }
            if server.port == 0 {
                return Err(invalid("port", "must be between 1 and 65535"));
            }
            if server.username.is_empty() {
                return Err(invalid("username", "cannot be empty"));
            }
        }

        let mut deployment_names = HashSet::new();
        for deployment in &self.deployments {
            if deployment.name.is_empty() {
                return Err(ConfigError::EmptyDeploymentName);
            }
            if !deployment_names.insert(deployment.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "deployment",
                    name: deployment.name.clone(),
                });
            }
            deployment
                .pipeline
                .validate()
                .map_err(|source| ConfigError::InvalidPipeline {
                    deployment: deployment.name.clone(),
                    source,
                })?;
        }

        for plan in &self.deploy_plans {
            if !server_names.contains(plan.server.as_str()) {
                return Err(ConfigError::InvalidReference {
                    kind: "server",
                    name: plan.server.clone(),
                });
            }
            if !deployment_names.contains(plan.deployment.as_str()) {
                return Err(ConfigError::InvalidReference {
                    kind: "deployment",
                    name: plan.deployment.clone(),
                });
            }
        }

        Ok(())
    }
}
