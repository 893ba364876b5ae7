//! Functional test runner for the user database HTTP API.
//!
//! Waits for the server to answer, runs the selected suites in order and
//! exits non-zero if any case failed.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use userdb_functional::HttpConnector;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = cli.base_url().context("Failed to resolve the server URL")?;
    let conn = HttpConnector::connect(url.as_str())
        .await
        .with_context(|| format!("Server at {} is not available", url))?;

    let mut failed = 0;
    for suite in cli.suite.suites() {
        let report = suite.run(&conn).await;
        println!("{}", report);
        if !report.is_success() {
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{} suite(s) failed", failed);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
