//! Command types for pipeline execution
//!
//! A command is the atomic unit of work in a deployment pipeline. The set of
//! kinds is closed; configuration carrying any other `type` tag is preserved
//! as [`Command::Unrecognized`] so the executor can reject that step.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kinds of commands the executor knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Shell command on the machine running the deployment
    Local,
    /// Shell command on the target server
    Remote,
    /// Single-file copy to the target server
    Transfer,
}

impl CommandKind {
    /// Tag used in configuration and in the deployment trace
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Transfer => "scp",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            "scp" | "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step of a deployment pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CommandRecord", into = "CommandRecord")]
pub enum Command {
    /// Run `sh -c <command>` locally
    Local {
        /// Shell text
        command: String,
        /// Directory to run in, relative to the current directory if not absolute
        working_dir: Option<PathBuf>,
    },

    /// Run a command on the target server
    Remote {
        /// Shell text
        command: String,
    },

    /// Copy one local file to the target server
    Transfer {
        /// Source file
        local_path: PathBuf,
        /// Destination path on the server
        remote_path: String,
    },

    /// A kind tag outside the supported set
    Unrecognized {
        /// The tag as written in configuration
        kind: String,
    },
}

impl Command {
    /// Creates a local command
    pub fn local(command: impl Into<String>) -> Self {
        Self::Local {
            command: command.into(),
            working_dir: None,
        }
    }

    /// Creates a local command that runs in `dir`
    pub fn local_in(command: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::Local {
            command: command.into(),
            working_dir: Some(dir.into()),
        }
    }

    /// Creates a remote command
    pub fn remote(command: impl Into<String>) -> Self {
        Self::Remote {
            command: command.into(),
        }
    }

    /// Creates a file transfer
    pub fn transfer(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self::Transfer {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
        }
    }

    /// Returns the kind, or `None` for unrecognized commands
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Self::Local { .. } => Some(CommandKind::Local),
            Self::Remote { .. } => Some(CommandKind::Remote),
            Self::Transfer { .. } => Some(CommandKind::Transfer),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Kind tag as it appears in the deployment trace
    pub fn kind_label(&self) -> &str {
        match self {
            Self::Unrecognized { kind } => kind,
            _ => self.kind().map_or("unknown", CommandKind::as_str),
        }
    }

    /// Shell text for local and remote commands
    pub fn shell_text(&self) -> Option<&str> {
        match self {
            Self::Local { command, .. } | Self::Remote { command } => Some(command),
            _ => None,
        }
    }

    /// Working directory of a local command
    pub fn working_dir(&self) -> Option<&Path> {
        match self {
            Self::Local { working_dir, .. } => working_dir.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { command, .. } | Self::Remote { command } => f.write_str(command),
            Self::Transfer {
                local_path,
                remote_path,
            } => write!(f, "{} -> {}", local_path.display(), remote_path),
            Self::Unrecognized { kind } => write!(f, "<{kind}>"),
        }
    }
}

/// Flat configuration record a [`Command`] is read from and written to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CommandRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    remote_path: String,
}

impl From<CommandRecord> for Command {
    fn from(record: CommandRecord) -> Self {
        match CommandKind::parse(&record.kind) {
            Some(CommandKind::Local) => Self::Local {
                command: record.command,
                working_dir: record.working_dir.filter(|dir| !dir.as_os_str().is_empty()),
            },
            Some(CommandKind::Remote) => Self::Remote {
                command: record.command,
            },
            Some(CommandKind::Transfer) => Self::Transfer {
                local_path: record.local_path.unwrap_or_default(),
                remote_path: record.remote_path,
            },
            None => Self::Unrecognized { kind: record.kind },
        }
    }
}

impl From<Command> for CommandRecord {
    fn from(command: Command) -> Self {
        match command {
            Command::Local {
                command,
                working_dir,
            } => Self {
                kind: CommandKind::Local.as_str().to_string(),
                command,
                working_dir,
                ..Self::default()
            },
            Command::Remote { command } => Self {
                kind: CommandKind::Remote.as_str().to_string(),
                command,
                ..Self::default()
            },
            Command::Transfer {
                local_path,
                remote_path,
            } => Self {
                kind: CommandKind::Transfer.as_str().to_string(),
                local_path: Some(local_path),
                remote_path,
                ..Self::default()
            },
            Command::Unrecognized { kind } => Self {
                kind,
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_local_with_working_dir() {
        let yaml = "type: local\ncommand: make build\nworking_dir: ./app\n";
        let command: Command = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(command, Command::local_in("make build", "./app"));
        assert_eq!(command.kind(), Some(CommandKind::Local));
    }

    #[test]
    fn test_parse_empty_working_dir_is_none() {
        let yaml = "type: local\ncommand: ls\nworking_dir: \"\"\n";
        let command: Command = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(command.working_dir(), None);
    }

    #[test]
    fn test_parse_scp_and_transfer_alias() {
        let scp: Command =
            serde_yaml::from_str("type: scp\nlocal_path: bin/app\nremote_path: /srv/app\n")
                .unwrap();
        let alias: Command =
            serde_yaml::from_str("type: transfer\nlocal_path: bin/app\nremote_path: /srv/app\n")
                .unwrap();

        assert_eq!(scp, Command::transfer("bin/app", "/srv/app"));
        assert_eq!(scp, alias);
    }

    #[test]
    fn test_parse_unknown_kind_is_preserved() {
        let command: Command = serde_yaml::from_str("type: rsync\ncommand: x\n").unwrap();

        assert_eq!(
            command,
            Command::Unrecognized {
                kind: "rsync".to_string()
            }
        );
        assert_eq!(command.kind(), None);
        assert_eq!(command.kind_label(), "rsync");
    }

    #[test]
    fn test_serialize_remote_omits_unused_fields() {
        let json = serde_json::to_string(&Command::remote("uptime")).unwrap();
        assert_eq!(json, r#"{"type":"remote","command":"uptime"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::local("echo ok").to_string(), "echo ok");
        assert_eq!(
            Command::transfer("/tmp/a", "/srv/a").to_string(),
            "/tmp/a -> /srv/a"
        );
        assert_eq!(Command::transfer("a", "b").kind_label(), "scp");
    }
}
