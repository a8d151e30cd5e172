//! quickdeploy - configuration-driven deployment runner
//!
//! Reads a YAML file describing servers, deployments and deploy plans, then
//! runs each plan's pipeline of local commands, remote commands and file
//! transfers over SSH.
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate the configuration
//! quickdeploy check -c deploy.yaml
//!
//! # Show what would run on one server
//! quickdeploy run --server web-1 --dry-run
//!
//! # Deploy everything
//! quickdeploy -c deploy.yaml
//!
//! # Generate shell completions
//! quickdeploy completions bash > /etc/bash_completion.d/quickdeploy
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
