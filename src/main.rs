//! tfvc - Terraform dependency lock file auditor
//!
//! Reads `.terraform.lock.hcl`, looks up every locked provider in its
//! registry and reports whether the pinned versions and constraints are
//! keeping up with what has been published.

use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tfvc::cli::CliArgs;
use tfvc::config::Settings;
use tfvc::orchestrator::Orchestrator;
use tfvc::output::create_formatter;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when the audit could not complete
const EXIT_INCOMPLETE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_INCOMPLETE)
        }
    }
}

/// Install a stderr subscriber; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "tfvc=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let settings = Settings::resolve(&args)?;

    if args.verbose {
        eprintln!("tfvc v{}", env!("CARGO_PKG_VERSION"));
    }

    let fail_on_warning = settings.fail_on_warning;
    let formatter = create_formatter(settings.output.clone());
    let orchestrator = Orchestrator::new(settings)?;
    let report = orchestrator.run().await?;

    // Output results
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    // Print errors in verbose mode
    if args.verbose && !report.errors.is_empty() {
        eprintln!();
        eprintln!("Errors encountered:");
        for error in &report.errors {
            eprintln!("  - {}", error);
        }
    }

    if report.is_failure(fail_on_warning) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
