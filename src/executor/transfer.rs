//! Single-file copy over the scp sink protocol
//!
//! The remote side runs `scp -t <path>` and reads, on its standard input, a
//! header line `C<mode> <length> <name>\n`, the file contents and a single
//! `\0` byte. It acknowledges each part with `\0`, or with `\x01`/`\x02`
//! followed by a message line when something went wrong.

use super::traits::{RawCompletion, RemoteChannel};
use crate::pipeline::TransportError;
use std::fs::{File, Metadata};
use std::io::{self, Write};
use std::path::Path;
use std::thread;

/// Header announcing one file to `scp -t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScpHeader {
    /// Permission bits
    pub mode: u32,
    /// Payload length in bytes
    pub len: u64,
    /// Base name the file is created under
    pub name: String,
}

impl ScpHeader {
    /// Builds the header for `file`, named after the last component of
    /// `remote_path`, or of `local_path` when `remote_path` is a directory
    #[must_use]
    pub fn new(metadata: &Metadata, local_path: &Path, remote_path: &str) -> Self {
        let remote_name = if is_directory_path(remote_path) {
            None
        } else {
            Path::new(remote_path).file_name()
        };
        let name = remote_name
            .or_else(|| local_path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            mode: file_mode(metadata),
            len: metadata.len(),
            name,
        }
    }

    /// The header line, including the trailing newline
    #[must_use]
    pub fn line(&self) -> String {
        format!("C{:04o} {} {}\n", self.mode, self.len, self.name)
    }
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &Metadata) -> u32 {
    0o644
}

fn is_directory_path(remote_path: &str) -> bool {
    remote_path.ends_with('/')
}

/// Directory that must exist on the remote host before the copy
///
/// A path ending in `/` names the directory itself.
#[must_use]
pub fn remote_parent(remote_path: &str) -> String {
    if is_directory_path(remote_path) {
        let dir = remote_path.trim_end_matches('/');
        return if dir.is_empty() { "/".to_string() } else { dir.to_string() };
    }
    match Path::new(remote_path).parent() {
        Some(parent) if parent.as_os_str().is_empty() => ".".to_string(),
        Some(parent) => parent.to_string_lossy().into_owned(),
        None => "/".to_string(),
    }
}

/// Shell text creating `dir` on the remote host
#[must_use]
pub fn mkdir_command(dir: &str) -> String {
    format!("mkdir -p {}", shell_words::quote(dir))
}

/// Shell text starting the receiving end of the protocol
#[must_use]
pub fn receive_command(remote_path: &str) -> String {
    format!("scp -t {}", shell_words::quote(remote_path))
}

/// Checks the acknowledgements written back by `scp -t`
///
/// # Errors
///
/// Returns the message of the first error acknowledgement.
pub fn parse_response(response: &[u8]) -> Result<(), String> {
    let mut bytes = response.iter();
    while let Some(&code) = bytes.next() {
        match code {
            0 => {}
            1 | 2 => {
                let message: Vec<u8> = bytes
                    .by_ref()
                    .take_while(|&&b| b != b'\n')
                    .copied()
                    .collect();
                let message = String::from_utf8_lossy(&message).trim().to_string();
                return Err(if message.is_empty() {
                    "remote scp reported an error".to_string()
                } else {
                    message
                });
            }
            other => {
                return Err(format!("unexpected scp acknowledgement byte {other:#04x}"));
            }
        }
    }
    Ok(())
}

fn write_payload(
    mut input: Box<dyn Write + Send>,
    header: &ScpHeader,
    mut file: File,
) -> io::Result<u64> {
    input.write_all(header.line().as_bytes())?;
    let copied = io::copy(&mut file, &mut input)?;
    input.write_all(&[0])?;
    input.flush()?;
    Ok(copied)
}

/// Streams `file` to `remote_path` through a raw session on `channel`
///
/// The payload is written by a scoped producer thread while the calling
/// thread waits for the remote side; both are finished when this returns.
///
/// # Errors
///
/// Returns a description of the first failure: transport, remote
/// acknowledgement, producer write, or completion status, in that order.
pub fn send_file<C: RemoteChannel + ?Sized>(
    channel: &mut C,
    file: File,
    header: &ScpHeader,
    remote_path: &str,
    output: &mut dyn Write,
) -> Result<u64, String> {
    let mut session = channel
        .open_raw_session(&receive_command(remote_path))
        .map_err(|e| format!("failed to create session: {e}"))?;
    let input = session
        .take_input()
        .ok_or_else(|| TransportError::MissingInput.to_string())?;

    let (written, completion) = thread::scope(|scope| {
        let producer = scope.spawn(move || write_payload(input, header, file));
        let completion = session.wait(output);
        let written = producer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("transfer writer panicked")));
        (written, completion)
    });

    let RawCompletion { status, response } =
        completion.map_err(|e| format!("scp failed: {e}"))?;
    parse_response(&response)?;
    let copied = written.map_err(|e| format!("failed to send file: {e}"))?;
    if !status.success() {
        return Err(format!("scp failed: {status}"));
    }

    Ok(copied)
}
