//! Local shell execution
//!
//! Commands run as `sh -c <text>` with stdout and stderr attached to the same
//! OS pipe, so the output sink sees both streams in the order the process
//! wrote them.

use super::traits::{CommandStatus, ProcessRunner};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Shell execution configuration
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shell to use (default: sh)
    pub shell: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

/// [`ProcessRunner`] backed by a real shell
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: ShellConfig,
}

impl ShellRunner {
    /// Creates a runner using `sh`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets shell to use
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.config.shell = shell.into();
        self
    }

    /// Returns the configured shell
    #[must_use]
    pub fn shell(&self) -> &str {
        &self.config.shell
    }
}

impl ProcessRunner for ShellRunner {
    fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        output: &mut dyn Write,
    ) -> io::Result<CommandStatus> {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c").arg(command);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(shell = %self.config.shell, command, "Executing shell command");
        run_interleaved(cmd, output)
    }
}

/// Spawns `cmd` with stdout and stderr sharing one pipe and copies everything
/// it writes into `output` until the process exits
///
/// The child is always reaped, including when forwarding output fails.
pub(crate) fn run_interleaved(
    mut cmd: Command,
    output: &mut dyn Write,
) -> io::Result<CommandStatus> {
    let (mut reader, writer) = os_pipe::pipe()?;
    let writer_clone = writer.try_clone()?;

    cmd.stdin(Stdio::null());
    cmd.stdout(writer);
    cmd.stderr(writer_clone);

    let mut child = cmd.spawn()?;
    // The Command still owns the write ends; the reader never sees EOF while
    // it is alive.
    drop(cmd);

    let copied = io::copy(&mut reader, output);
    if copied.is_err() {
        let _ = child.kill();
    }
    let status = child.wait()?;
    copied?;
    output.flush()?;

    Ok(status.into())
}
