//! relink CLI binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relink_cli::commands::{InitConfigCommand, SendCommand, WatchCommand};
use relink_cli::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Watch => {
            let settings = cli.settings().context("invalid client settings")?;
            WatchCommand::new(settings).execute(&mut stdout).await?;
        }
        Commands::Send {
            payload,
            timeout_secs,
        } => {
            let settings = cli.settings().context("invalid client settings")?;
            SendCommand::new(settings, payload, Duration::from_secs(*timeout_secs))
                .execute(&mut stdout)
                .await?;
        }
        Commands::InitConfig { path, force } => {
            InitConfigCommand::new(path, *force)
                .execute(&mut stdout)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    Ok(())
}
