use super::session::{SSH_FAILURE_STATUS, SshSession};
use crate::config::Server;
use crate::executor::{CommandStatus, RawSession, RemoteChannel, run_interleaved};
use crate::infrastructure::Settings;
use crate::pipeline::TransportError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

const CONTROL_SOCKET: &str = "control";
const CONNECT_LOG: &str = "connect.log";

/// Options applied to every ssh invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    /// Client program
    pub program: String,
    /// Seconds to wait for the connection to be established
    pub connect_timeout_secs: u64,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SshOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            program: settings.ssh_program.clone(),
            connect_timeout_secs: settings.connect_timeout_secs,
        }
    }
}

/// How an invocation relates to the shared master connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlMode {
    /// Start the master and keep it running in the background
    Master,
    /// Reuse the running master
    Client,
}

/// Authenticated connection to one server
///
/// The first invocation starts an OpenSSH master connection on a control
/// socket inside a private temporary directory. Commands and sessions are
/// multiplexed over it, so authentication happens once per channel.
pub struct SshChannel {
    destination: String,
    port: u16,
    identity_file: Option<String>,
    password: Option<String>,
    options: SshOptions,
    control_dir: Option<TempDir>,
}

impl SshChannel {
    /// Connects to `server` and authenticates
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connection`] if the server cannot be reached
    /// or rejects the credentials.
    pub fn connect(server: &Server, options: &SshOptions) -> Result<Self, TransportError> {
        let control_dir = tempfile::Builder::new()
            .prefix("quickdeploy-ssh-")
            .tempdir()?;
        let channel = Self {
            destination: format!("{}@{}", server.username, server.host),
            port: server.port,
            identity_file: server.identity_file.clone().filter(|f| !f.is_empty()),
            password: server.password().map(str::to_string),
            options: options.clone(),
            control_dir: Some(control_dir),
        };
        channel.establish()?;
        tracing::debug!(destination = %channel.destination, "SSH connection established");
        Ok(channel)
    }

    /// Returns `user@host`
    pub fn destination(&self) -> &str {
        &self.destination
    }

    fn control_path(&self) -> Result<PathBuf, TransportError> {
        self.control_dir
            .as_ref()
            .map(|dir| dir.path().join(CONTROL_SOCKET))
            .ok_or(TransportError::Closed)
    }

    fn ssh_args(&self, control_path: &Path, mode: ControlMode) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        let mut options = Vec::new();
        if self.password.is_none() {
            options.push("BatchMode=yes".to_string());
        }
        options.extend([
            "StrictHostKeyChecking=accept-new".to_string(),
            format!("ConnectTimeout={}", self.options.connect_timeout_secs),
            "ServerAliveInterval=15".to_string(),
            "ServerAliveCountMax=3".to_string(),
            format!("ControlPath={}", control_path.display()),
        ]);
        match mode {
            ControlMode::Master => {
                options.push("ControlMaster=yes".to_string());
                options.push("ControlPersist=yes".to_string());
            }
            ControlMode::Client => options.push("ControlMaster=no".to_string()),
        }
        for option in options {
            args.push("-o".to_string());
            args.push(option);
        }

        args.push(self.destination.clone());
        args
    }

    fn command(&self, mode: ControlMode) -> Result<Command, TransportError> {
        let control_path = self.control_path()?;
        let mut cmd = match &self.password {
            Some(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.arg("-e").arg(&self.options.program);
                cmd.env("SSHPASS", password);
                cmd
            }
            None => Command::new(&self.options.program),
        };
        cmd.args(self.ssh_args(&control_path, mode));
        Ok(cmd)
    }

    fn establish(&self) -> Result<(), TransportError> {
        let log_path = self
            .control_dir
            .as_ref()
            .map(|dir| dir.path().join(CONNECT_LOG))
            .ok_or(TransportError::Closed)?;

        // The master stays in the background holding any inherited pipes,
        // so its diagnostics go to a file instead.
        let log = File::create(&log_path)?;
        let mut cmd = self.command(ControlMode::Master)?;
        cmd.arg("true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(log);

        let status = cmd.status().map_err(|e| TransportError::Connection {
            destination: self.destination.clone(),
            message: format!("failed to start {}: {e}", self.options.program),
        })?;
        if status.success() {
            return Ok(());
        }

        let diagnostics = fs::read_to_string(&log_path).unwrap_or_default();
        let diagnostics = diagnostics.trim();
        Err(TransportError::Connection {
            destination: self.destination.clone(),
            message: if diagnostics.is_empty() {
                format!("ssh exited with {status}")
            } else {
                diagnostics.to_string()
            },
        })
    }
}

impl RemoteChannel for SshChannel {
    fn run_command(
        &mut self,
        command: &str,
        output: &mut dyn Write,
    ) -> Result<CommandStatus, TransportError> {
        let mut cmd = self.command(ControlMode::Client)?;
        cmd.arg(command);

        let status = run_interleaved(cmd, output)?;
        if status.code() == Some(SSH_FAILURE_STATUS) {
            return Err(TransportError::Connection {
                destination: self.destination.clone(),
                message: format!("ssh exited with status {SSH_FAILURE_STATUS}"),
            });
        }
        Ok(status)
    }

    fn open_raw_session(
        &mut self,
        command_line: &str,
    ) -> Result<Box<dyn RawSession + '_>, TransportError> {
        let mut cmd = self.command(ControlMode::Client)?;
        cmd.arg(command_line)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn()?;
        Ok(Box::new(SshSession::new(child, self.destination.clone())))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let Some(dir) = self.control_dir.take() else {
            return Ok(());
        };

        let status = Command::new(&self.options.program)
            .arg("-S")
            .arg(dir.path().join(CONTROL_SOCKET))
            .args(["-O", "exit"])
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            tracing::debug!(destination = %self.destination, %status, "SSH master already gone");
        }
        Ok(())
    }
}

impl Drop for SshChannel {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(destination = %self.destination, error = %e, "Failed to close SSH connection");
        }
    }
}
