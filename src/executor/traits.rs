//! Collaborator traits for pipeline execution
//!
//! The executor never talks to processes or hosts directly. Local commands go
//! through a [`ProcessRunner`], remote commands and transfers through a
//! [`RemoteChannel`] that is already connected and authenticated.

use crate::pipeline::TransportError;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// Completion status of a command that ran to the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    code: Option<i32>,
}

impl CommandStatus {
    /// Status of a process that exited with `code`
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Status of a process killed before it could exit
    #[must_use]
    pub fn terminated() -> Self {
        Self { code: None }
    }

    /// Exit code, if the process exited normally
    #[must_use]
    pub fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns true for exit code 0
    #[must_use]
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Runs shell text on the local machine
pub trait ProcessRunner {
    /// Runs `command` through the shell in `cwd` (or the current directory),
    /// writing stdout and stderr interleaved into `output`
    ///
    /// # Errors
    ///
    /// Returns an IO error if the process could not be spawned or its output
    /// could not be forwarded. A non-zero exit is not an error.
    fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        output: &mut dyn Write,
    ) -> io::Result<CommandStatus>;
}

/// Everything a raw session reported once it completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    /// Completion status of the protocol invocation
    pub status: CommandStatus,
    /// Bytes the remote side wrote back on its output stream
    pub response: Vec<u8>,
}

/// A remote process with a writable input stream, used for transfers
pub trait RawSession {
    /// Takes the input stream; the remote side sees EOF once it is dropped
    fn take_input(&mut self) -> Option<Box<dyn Write + Send>>;

    /// Waits for the remote process to finish
    ///
    /// Diagnostics the remote side prints on its error stream are forwarded
    /// to `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the channel failed.
    fn wait(self: Box<Self>, output: &mut dyn Write) -> Result<RawCompletion, TransportError>;
}

/// Authenticated handle to one remote host
pub trait RemoteChannel {
    /// Runs `command` on the remote host, streaming combined output into
    /// `output`
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the command could not be delivered or
    /// the connection dropped. A non-zero exit is reported in the status.
    fn run_command(
        &mut self,
        command: &str,
        output: &mut dyn Write,
    ) -> Result<CommandStatus, TransportError>;

    /// Starts `command_line` on the remote host with a raw input stream
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the session could not be opened.
    fn open_raw_session(
        &mut self,
        command_line: &str,
    ) -> Result<Box<dyn RawSession + '_>, TransportError>;

    /// Releases the connection
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the connection did not shut down
    /// cleanly.
    fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_status_success() {
        assert!(CommandStatus::from_code(0).success());
        assert!(!CommandStatus::from_code(1).success());
        assert!(!CommandStatus::terminated().success());
    }

    #[test]
    fn test_command_status_display() {
        assert_eq!(CommandStatus::from_code(2).to_string(), "exit status 2");
        assert_eq!(
            CommandStatus::terminated().to_string(),
            "terminated by signal"
        );
    }
}
