use crate::executor::{RawCompletion, RawSession};
use crate::pipeline::TransportError;
use std::io::{self, Read, Write};
use std::process::Child;
use std::thread;

/// Exit status `ssh` uses for its own failures
pub(crate) const SSH_FAILURE_STATUS: i32 = 255;

/// Remote process started over ssh with its stdin, stdout and stderr piped
pub struct SshSession {
    child: Option<Child>,
    destination: String,
}

impl SshSession {
    pub(crate) fn new(child: Child, destination: impl Into<String>) -> Self {
        Self {
            child: Some(child),
            destination: destination.into(),
        }
    }
}

impl RawSession for SshSession {
    fn take_input(&mut self) -> Option<Box<dyn Write + Send>> {
        let stdin = self.child.as_mut()?.stdin.take()?;
        Some(Box::new(stdin))
    }

    fn wait(mut self: Box<Self>, output: &mut dyn Write) -> Result<RawCompletion, TransportError> {
        let mut child = self.child.take().ok_or(TransportError::Closed)?;
        drop(child.stdin.take());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (response, diagnostics) = thread::scope(|scope| {
            let errors = scope.spawn(move || read_all(stderr));
            let response = read_all(stdout);
            let diagnostics = errors
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
            (response, diagnostics)
        });

        if response.is_err() || diagnostics.is_err() {
            let _ = child.kill();
        }
        let status = child.wait()?;
        let response = response?;
        let diagnostics = diagnostics?;
        output.write_all(&diagnostics)?;

        if status.code() == Some(SSH_FAILURE_STATUS) {
            let message = String::from_utf8_lossy(&diagnostics).trim().to_string();
            return Err(TransportError::Connection {
                destination: self.destination.clone(),
                message: if message.is_empty() {
                    format!("ssh exited with status {SSH_FAILURE_STATUS}")
                } else {
                    message
                },
            });
        }

        Ok(RawCompletion {
            status: status.into(),
            response,
        })
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn read_all<R: Read>(stream: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf)?;
    }
    Ok(buf)
}
