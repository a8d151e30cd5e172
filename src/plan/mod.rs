//! Deploy plan orchestration
//!
//! A plan pairs a configured server with a configured deployment. The
//! [`PlanRunner`] connects to each server in turn, runs the deployment's
//! pipeline through an [`Executor`](crate::executor::Executor) and tallies the
//! results into a [`PlanSummary`].

mod runner;
mod summary;

pub use runner::{PlanFilter, PlanRunner};
pub use summary::{PlanRecord, PlanSummary};

use crate::config::Server;
use crate::executor::RemoteChannel;
use crate::pipeline::TransportError;

/// Opens authenticated channels to configured servers
pub trait Connector {
    /// Channel type produced by this connector
    type Channel: RemoteChannel;

    /// Connects and authenticates to `server`
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the server cannot be reached or
    /// rejects the credentials.
    fn connect(&self, server: &Server) -> Result<Self::Channel, TransportError>;
}
