//! CLI argument parsing module for tfvc

use crate::config::MAX_CONCURRENCY;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Terraform dependency lock file auditor
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tfvc",
    version,
    about = "Audit Terraform provider versions against the registry"
)]
pub struct CliArgs {
    /// Directory containing .terraform.lock.hcl, or the lock file itself
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - only report warnings and failures
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    // Provider filters
    /// Exclude a provider from the audit (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Audit only these providers (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Exit with a failure status when any provider has a warning
    #[arg(long)]
    pub fail_on_warning: bool,

    // Registry options
    /// Maximum number of concurrent registry requests
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_CONCURRENCY as u64))]
    pub concurrency: Option<u64>,

    /// Registry request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Path to a config file (default: .tfvc.toml next to the lock file)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
