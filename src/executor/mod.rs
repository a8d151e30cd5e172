//! Pipeline execution layer
//!
//! This module contains the executor, the strategies it dispatches commands
//! to, and the collaborator traits it runs them through.

pub mod policy;
mod runner;
mod shell;
pub mod transfer;
mod traits;

pub use policy::is_ignorable;
pub use runner::{Executor, Target};
pub(crate) use runner::emit;
pub use shell::{ShellConfig, ShellRunner};
pub use traits::{CommandStatus, ProcessRunner, RawCompletion, RawSession, RemoteChannel};

pub(crate) use shell::run_interleaved;
