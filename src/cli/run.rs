//! `quickdeploy run` - Execute deploy plans
//!
//! Connects to each planned server over SSH and runs the deployment's
//! pipeline. The deployment trace goes to stdout, or to stderr when the
//! summary is printed as JSON.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use quickdeploy::config::DeployConfig;
use quickdeploy::plan::{PlanFilter, PlanRunner, PlanSummary};
use quickdeploy::ssh::{SshConnector, SshOptions};
use std::io::{self, Write};
use std::process::ExitCode;

/// Arguments of `quickdeploy run`
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Only run plans targeting this server
    #[arg(long)]
    pub server: Option<String>,

    /// Only run plans deploying this deployment
    #[arg(long)]
    pub deployment: Option<String>,

    /// List the steps of each plan without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Summary format
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary block
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

/// Runs the selected plans and prints the summary
pub fn run_plans(config: &DeployConfig, args: &RunArgs) -> Result<ExitCode> {
    let filter = PlanFilter {
        server: args.server.clone(),
        deployment: args.deployment.clone(),
    };
    ensure_selection(config, &filter)?;

    let runner = PlanRunner::new()
        .with_filter(filter)
        .dry_run(args.dry_run)
        .with_shell(config.settings.shell.clone());
    let connector = SshConnector::new(SshOptions::from(&config.settings));

    let summary = match args.format {
        OutputFormat::Text => {
            let summary = runner.run(config, &connector, &mut io::stdout().lock());
            report_failures(&summary);
            summary
                .write_text(&mut io::stdout().lock())
                .context("Failed to write summary")?;
            summary
        }
        OutputFormat::Json => {
            let summary = runner.run(config, &connector, &mut io::stderr().lock());
            let json = summary.to_json().context("Failed to serialize summary")?;
            writeln!(io::stdout().lock(), "{json}").context("Failed to write summary")?;
            summary
        }
    };

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Rejects filters that select nothing; an unfiltered empty plan list is fine
fn ensure_selection(config: &DeployConfig, filter: &PlanFilter) -> Result<()> {
    let filtered = filter.server.is_some() || filter.deployment.is_some();
    if filtered && !config.deploy_plans.iter().any(|plan| filter.matches(plan)) {
        bail!("no deploy plans match the given filters");
    }
    Ok(())
}

fn report_failures(summary: &PlanSummary) {
    for record in summary.failures() {
        eprintln!(
            "Error in deployment plan (server: {}, deployment: {}): {}",
            record.server,
            record.deployment,
            record.error.as_deref().unwrap_or("unknown error")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(plans: &str) -> DeployConfig {
        DeployConfig::from_yaml(&format!(
            "servers:\n  - {{ name: web-1, host: h, username: u }}\n\
             deployments:\n  - name: app\n    pipeline:\n      commands:\n        \
             - {{ type: remote, command: uptime }}\n{plans}"
        ))
        .unwrap()
    }

    #[test]
    fn test_empty_plan_list_is_accepted() {
        let config = config("");
        assert!(ensure_selection(&config, &PlanFilter::default()).is_ok());
    }

    #[test]
    fn test_filter_matching_nothing_is_rejected() {
        let config = config("deploy_plans:\n  - { server: web-1, deployment: app }\n");
        let filter = PlanFilter {
            server: Some("web-9".to_string()),
            deployment: None,
        };

        let err = ensure_selection(&config, &filter).unwrap_err();
        assert_eq!(err.to_string(), "no deploy plans match the given filters");
        assert!(ensure_selection(&config, &PlanFilter::default()).is_ok());
    }
}
