use super::policy::is_ignorable;
use super::shell::ShellRunner;
use super::traits::{CommandStatus, ProcessRunner, RemoteChannel};
use super::transfer::{self, ScpHeader};
use crate::pipeline::{
    Command, ExecutionError, ExecutionOutcome, Pipeline, PipelineReport, StepFailure,
    TransportError,
};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Identity of the server a pipeline runs against, used for labelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Configured server name
    pub name: String,
    /// Host name or address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
}

impl Target {
    /// Creates a target on port 22
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 22,
            username: username.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// How a single command ended
enum StepOutcome {
    Succeeded,
    Ignored(String),
}

/// Runs one pipeline against one target
///
/// Commands run strictly in order. The first failure that is not classified
/// ignorable stops the run; later commands are never attempted. Every command
/// is announced on the output sink before it runs and reported after.
pub struct Executor<C, W, R = ShellRunner> {
    target: Target,
    channel: C,
    runner: R,
    output: W,
}

impl<C: RemoteChannel, W: Write> Executor<C, W> {
    /// Creates an executor running local commands through `sh`
    pub fn new(target: Target, channel: C, output: W) -> Self {
        Self {
            target,
            channel,
            runner: ShellRunner::new(),
            output,
        }
    }
}

impl<C: RemoteChannel, W: Write, R: ProcessRunner> Executor<C, W, R> {
    /// Replaces the local process runner
    pub fn with_runner<R2: ProcessRunner>(self, runner: R2) -> Executor<C, W, R2> {
        Executor {
            target: self.target,
            channel: self.channel,
            runner,
            output: self.output,
        }
    }

    /// The target this executor deploys to
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Releases the remote channel
    ///
    /// # Errors
    ///
    /// Returns the channel's error if it did not shut down cleanly.
    pub fn close(mut self) -> Result<(), TransportError> {
        self.channel.close()
    }

    /// Runs every command of `pipeline` in order
    pub fn run(&mut self, pipeline: &Pipeline) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let total = pipeline.commands.len();
        let started = Instant::now();

        tracing::info!(
            run_id = %run_id,
            server = %self.target.name,
            commands = total,
            "Starting pipeline execution"
        );
        emit(
            &mut self.output,
            format_args!(
                "\n==> Starting deployment on server: {} ({})\n",
                self.target.name, self.target.host
            ),
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut failure = None;

        for (i, command) in pipeline.commands.iter().enumerate() {
            let step = i + 1;
            emit(&mut self.output, format_args!("\n==> Step {step}/{total}\n"));

            let step_started = Instant::now();
            let result = self.execute(command);
            let duration = step_started.elapsed();

            match result {
                Ok(StepOutcome::Succeeded) => {
                    tracing::info!(
                        run_id = %run_id,
                        step,
                        kind = command.kind_label(),
                        duration_ms = duration.as_millis(),
                        "Command completed"
                    );
                    outcomes.push(ExecutionOutcome::success(command, duration));
                }
                Ok(StepOutcome::Ignored(reason)) => {
                    tracing::warn!(
                        run_id = %run_id,
                        step,
                        kind = command.kind_label(),
                        reason = %reason,
                        "Command failed, error ignored"
                    );
                    outcomes.push(ExecutionOutcome::ignored(command, duration, reason));
                }
                Err(error) => {
                    tracing::error!(
                        run_id = %run_id,
                        step,
                        kind = command.kind_label(),
                        error = %error,
                        "Command failed, stopping pipeline"
                    );
                    outcomes.push(ExecutionOutcome::failure(command, duration, &error));
                    failure = Some(StepFailure { step, error });
                    break;
                }
            }
        }

        let total_duration = started.elapsed();
        let succeeded = failure.is_none();
        if succeeded {
            emit(
                &mut self.output,
                format_args!(
                    "\n==> Deployment completed successfully in {:.2} seconds\n",
                    total_duration.as_secs_f64()
                ),
            );
        } else {
            emit(
                &mut self.output,
                format_args!(
                    "\n==> Deployment failed after {:.2} seconds\n",
                    total_duration.as_secs_f64()
                ),
            );
        }

        PipelineReport {
            run_id,
            outcomes,
            succeeded,
            total_duration,
            failure,
        }
    }

    fn execute(&mut self, command: &Command) -> Result<StepOutcome, ExecutionError> {
        match command {
            Command::Local {
                command,
                working_dir,
            } => self.execute_local(command, working_dir.as_deref()),
            Command::Remote { command } => self.execute_remote(command),
            Command::Transfer {
                local_path,
                remote_path,
            } => self.execute_transfer(local_path, remote_path),
            Command::Unrecognized { kind } => {
                let error = ExecutionError::UnknownCommandKind { kind: kind.clone() };
                let started = self.announce(kind, &command.to_string());
                self.finish(started, Err(&error));
                Err(error)
            }
        }
    }

    fn execute_local(
        &mut self,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<StepOutcome, ExecutionError> {
        let started = self.announce("local", command);

        let result = match working_dir.map(std::path::absolute).transpose() {
            Err(e) => Err(ExecutionError::PathResolution {
                path: working_dir.unwrap_or(Path::new("")).to_path_buf(),
                reason: e.to_string(),
            }),
            Ok(cwd) => match self.runner.run(command, cwd.as_deref(), &mut self.output) {
                Err(e) => Err(ExecutionError::LocalExecution {
                    command: command.to_string(),
                    reason: e.to_string(),
                }),
                Ok(status) => classify(command, status, |reason| {
                    ExecutionError::LocalExecution {
                        command: command.to_string(),
                        reason,
                    }
                }),
            },
        };

        self.finish_step(started, result)
    }

    fn execute_remote(&mut self, command: &str) -> Result<StepOutcome, ExecutionError> {
        let started = self.announce("remote", command);

        let result = match self.channel.run_command(command, &mut self.output) {
            Err(e) => Err(ExecutionError::RemoteExecution {
                command: command.to_string(),
                reason: e.to_string(),
            }),
            Ok(status) => classify(command, status, |reason| {
                ExecutionError::RemoteExecution {
                    command: command.to_string(),
                    reason,
                }
            }),
        };

        self.finish_step(started, result)
    }

    fn execute_transfer(
        &mut self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<StepOutcome, ExecutionError> {
        let started = self.announce(
            "scp",
            &format!("{} -> {}", local_path.display(), remote_path),
        );
        let fail = |reason: String| ExecutionError::Transfer {
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            reason,
        };

        let result = self.transfer(local_path, remote_path).map_err(fail);
        self.finish_step(started, result.map(|()| StepOutcome::Succeeded))
    }

    fn transfer(&mut self, local_path: &Path, remote_path: &str) -> Result<(), String> {
        let file = File::open(local_path).map_err(|e| format!("failed to open local file: {e}"))?;
        let metadata = file
            .metadata()
            .map_err(|e| format!("failed to get file info: {e}"))?;
        if !metadata.is_file() {
            return Err(format!(
                "failed to open local file: {} is not a regular file",
                local_path.display()
            ));
        }
        let header = ScpHeader::new(&metadata, local_path, remote_path);

        let parent = transfer::remote_parent(remote_path);
        self.execute_remote(&transfer::mkdir_command(&parent))
            .map_err(|e| format!("failed to create remote directory: {e}"))?;

        let bytes = transfer::send_file(
            &mut self.channel,
            file,
            &header,
            remote_path,
            &mut self.output,
        )?;
        tracing::debug!(
            server = %self.target.name,
            remote_path,
            bytes,
            "File transferred"
        );
        Ok(())
    }

    fn announce(&mut self, kind: &str, text: &str) -> Instant {
        emit(
            &mut self.output,
            format_args!(
                "==> [{}] Executing {kind} command: {text}\n",
                self.target.name
            ),
        );
        Instant::now()
    }

    fn finish_step(
        &mut self,
        started: Instant,
        result: Result<StepOutcome, ExecutionError>,
    ) -> Result<StepOutcome, ExecutionError> {
        self.finish(started, result.as_ref());
        result
    }

    fn finish(&mut self, started: Instant, result: Result<&StepOutcome, &ExecutionError>) {
        let secs = started.elapsed().as_secs_f64();
        let name = &self.target.name;
        let line = match result {
            Ok(StepOutcome::Succeeded) => {
                format!("==> [{name}] Command completed successfully ({secs:.2}s)\n")
            }
            Ok(StepOutcome::Ignored(_)) => {
                format!("==> [{name}] Command completed with ignored error ({secs:.2}s)\n")
            }
            Err(error) => format!("==> [{name}] Command failed ({secs:.2}s): {error}\n"),
        };
        emit(&mut self.output, format_args!("{line}"));
    }
}

/// Writes one trace line to the output sink
pub(crate) fn emit<W: Write + ?Sized>(output: &mut W, args: fmt::Arguments<'_>) {
    if let Err(e) = output.write_fmt(args).and_then(|()| output.flush()) {
        tracing::debug!(error = %e, "Failed to write to output sink");
    }
}

/// Applies the ignore policy to a command that ran to completion
fn classify(
    command: &str,
    status: CommandStatus,
    fatal: impl FnOnce(String) -> ExecutionError,
) -> Result<StepOutcome, ExecutionError> {
    if status.success() {
        Ok(StepOutcome::Succeeded)
    } else if is_ignorable(command) {
        Ok(StepOutcome::Ignored(status.to_string()))
    } else {
        Err(fatal(status.to_string()))
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
