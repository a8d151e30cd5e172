//! SSH transport
//!
//! Remote commands and transfers run through the system `ssh` client, so host
//! aliases, agents and known hosts behave exactly as they do for the user.
//! Password authentication goes through `sshpass`.

mod client;
mod session;

pub use client::{SshChannel, SshOptions};
pub use session::SshSession;

use crate::config::Server;
use crate::pipeline::TransportError;
use crate::plan::Connector;

/// Opens [`SshChannel`]s with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: SshOptions,
}

impl SshConnector {
    /// Creates a connector
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// Returns the options applied to every connection
    pub fn options(&self) -> &SshOptions {
        &self.options
    }
}

impl Connector for SshConnector {
    type Channel = SshChannel;

    fn connect(&self, server: &Server) -> Result<SshChannel, TransportError> {
        SshChannel::connect(server, &self.options)
    }
}
