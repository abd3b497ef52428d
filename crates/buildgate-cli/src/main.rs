//! Buildgate - documentation autobuilder status checker
//!
//! The `buildgate` command resolves a documentation build for an
//! `actor/owner/repo/branch` tuple and gates on its log output:
//!
//! - exit 0: the build completed with no unexpected warnings or errors
//!   (pre-approved noise from the allow-list does not count)
//! - exit 1: unexpected errors were found (printed to stderr,
//!   newline-joined), or something failed during resolution

use std::path::PathBuf;

use anyhow::{Context, Result};
use buildgate_check::{BuildCheck, CheckVerdict};
use buildgate_core::{init_tracing, CheckConfig};
use buildgate_state::BuildQueue;
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "buildgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check the status of a remote documentation build", long_about = None)]
struct Cli {
    /// Build to check, as 'actor/owner/repo/branch'
    target: String,

    /// Path to a TOML config file (default: compiled-in allow-list)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit the verdict and log lines as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // Configuration errors are fatal: a check never starts with a config
    // that did not validate.
    let config = CheckConfig::load(cli.config.as_deref())?;

    let queue = BuildQueue::from_env()
        .await
        .context("Failed to connect to build queue")?;

    let verdict = BuildCheck::run(&queue, &cli.target, &config).await?;

    report(&verdict, cli.json)
}

/// Print the verdict and map it to the process exit code.
///
/// Unexpected entries go to stderr newline-joined; stdout carries only the
/// summary (or the whole verdict as JSON in `--json` mode).
fn report(verdict: &CheckVerdict, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
    } else {
        println!("{}", verdict.message);
    }

    if verdict.passed() {
        Ok(())
    } else {
        eprintln!("{}", verdict.unexpected.join("\n"));
        anyhow::bail!("Documentation build check failed")
    }
}
