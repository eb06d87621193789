#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod shell;
mod telemetry;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use s3nav_core::Navigator;
use s3nav_storage::S3Client;
use tokio::io::BufReader;

use crate::config::Cli;
use crate::shell::Shell;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "s3nav_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "s3nav_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "s3nav_cli::config";
pub const TRACING_TARGET_SHELL: &str = "s3nav_cli::shell";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let resolved = cli
        .credentials
        .resolve()
        .context("failed to resolve credentials")?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        identity = %resolved.identity,
        access_key = %resolved.credentials.access_key_masked(),
        "credentials resolved"
    );

    let s3_config = cli.storage.to_s3_config(resolved.credentials)?;
    let client = S3Client::new(s3_config).context("failed to create storage client")?;
    let navigator = Navigator::new(Arc::new(client), cli.navigator);

    let mut shell = Shell::new(navigator, resolved.identity).with_spinner(true);
    shell.start().await.context("failed to list buckets")?;

    let stdin = BufReader::new(tokio::io::stdin());
    shell.run(stdin, tokio::io::stdout()).await
}
