//! Runner settings

use serde::{Deserialize, Serialize};

/// Settings that control how plans are executed, independent of what they
/// deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Shell running local commands
    pub shell: String,
    /// SSH client program
    pub ssh_program: String,
    /// Seconds to wait for an SSH connection to be established
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            shell: "sh".to_string(),
            ssh_program: "ssh".to_string(),
            connect_timeout_secs: 10,
        }
    }
}
