//! Command line interface for quickdeploy
//!
//! - `run` (default): execute the configured deploy plans
//! - `check`: validate the configuration and list the plans
//! - `completions`: generate shell completions

pub mod check;
pub mod completions;
pub mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quickdeploy::config::{DEFAULT_CONFIG_FILE, DeployConfig};
use quickdeploy::infrastructure::init_logging;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CLI arguments for quickdeploy
#[derive(Parser, Debug)]
#[command(name = "quickdeploy")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Path to deployment configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level, unless RUST_LOG is set (defaults to the configured level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute deploy plans
    Run(run::RunArgs),

    /// Validate the configuration and list deploy plans
    Check,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<ShellArg> for clap_complete::Shell {
    fn from(shell: ShellArg) -> Self {
        match shell {
            ShellArg::Bash => Self::Bash,
            ShellArg::Zsh => Self::Zsh,
            ShellArg::Fish => Self::Fish,
            ShellArg::PowerShell => Self::PowerShell,
            ShellArg::Elvish => Self::Elvish,
        }
    }
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let command = match args.command {
        Some(Command::Completions { shell, output }) => {
            let completions = completions::generate_completions(shell.into())?;
            match output {
                Some(path) => completions::save_completions(&completions, &path)?,
                None => print!("{completions}"),
            }
            return Ok(ExitCode::SUCCESS);
        }
        Some(command) => command,
        None => Command::Run(run::RunArgs::default()),
    };

    let config = load_config(&args.config)?;
    init_logging(
        args.log_level
            .as_deref()
            .unwrap_or(&config.settings.log_level),
    );

    match command {
        Command::Run(run_args) => run::run_plans(&config, &run_args),
        Command::Check => {
            check::check_config(&config, &mut io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn load_config(path: &Path) -> Result<DeployConfig> {
    DeployConfig::load(path)
        .with_context(|| format!("Error loading configuration from {}", path.display()))
}
