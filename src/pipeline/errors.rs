//! Error types for pipeline domain

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a pipeline run
///
/// Every variant carries the context of the command that triggered it. Command
/// failures matched by the ignore policy never become an `ExecutionError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The working directory of a local command could not be made absolute
    #[error("failed to resolve working directory '{}': {reason}", path.display())]
    PathResolution {
        /// Directory as configured.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// A local command could not be run or exited unsuccessfully
    #[error("local command failed: {command}: {reason}")]
    LocalExecution {
        /// Shell text of the command.
        command: String,
        /// Underlying cause.
        reason: String,
    },

    /// A remote command exited unsuccessfully or the channel failed
    #[error("remote command failed: {command}: {reason}")]
    RemoteExecution {
        /// Shell text of the command.
        command: String,
        /// Underlying cause.
        reason: String,
    },

    /// A file transfer failed at any stage
    #[error("transfer of {} to {remote_path} failed: {reason}", local_path.display())]
    Transfer {
        /// Source file on the local host.
        local_path: PathBuf,
        /// Destination path on the remote host.
        remote_path: String,
        /// Underlying cause.
        reason: String,
    },

    /// The command kind is outside the closed set of supported kinds
    #[error("unknown command type: {kind}")]
    UnknownCommandKind {
        /// Kind tag as configured.
        kind: String,
    },
}

/// Failures reported by a remote channel itself, as opposed to a command
/// that ran and exited unsuccessfully
#[derive(Error, Debug)]
pub enum TransportError {
    /// The connection could not be established or was lost
    #[error("connection to {destination} failed: {message}")]
    Connection {
        /// `user@host` of the remote side.
        destination: String,
        /// Diagnostic reported by the transport.
        message: String,
    },

    /// A raw session was opened without a writable input stream
    #[error("session input stream is unavailable")]
    MissingInput,

    /// The channel was used after being closed
    #[error("channel is closed")]
    Closed,

    /// IO error while talking to the transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors for pipeline components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Pipeline must have at least one command
    #[error("Pipeline must have at least one command")]
    EmptyPipeline,

    /// Local and remote commands need shell text
    #[error("Command {index} ({kind}) has an empty command string")]
    EmptyCommand {
        /// 1-based position of the command in its pipeline.
        index: usize,
        /// Kind tag of the command.
        kind: String,
    },

    /// Transfers need both a source and a destination
    #[error("Command {index} (scp) needs both local_path and remote_path")]
    EmptyTransferPath {
        /// 1-based position of the command in its pipeline.
        index: usize,
    },
}
