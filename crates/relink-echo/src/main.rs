//! Echo and heartbeat server binary.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use relink_echo::{EchoConfig, EchoServer, DEFAULT_BIND_ADDR, DEFAULT_PREFIX};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// WebSocket echo server with a periodic greeting push.
#[derive(Parser, Debug)]
#[command(name = "relink-echo")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(short, long, env = "RELINK_ECHO_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Prefix prepended to echoed messages.
    #[arg(long, env = "RELINK_ECHO_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Greeting pushed to every client. Defaults to one naming the address.
    #[arg(long, env = "RELINK_ECHO_GREETING")]
    greeting: Option<String>,

    /// Milliseconds between greeting pushes.
    #[arg(
        long,
        env = "RELINK_ECHO_INTERVAL_MS",
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,
}

impl Args {
    fn into_config(self) -> EchoConfig {
        let config = EchoConfig::new(self.bind)
            .with_prefix(self.prefix)
            .with_greeting_interval(Duration::from_millis(self.interval_ms));
        match self.greeting {
            Some(greeting) => config.with_greeting(greeting),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let server = EchoServer::bind(args.into_config())
        .await
        .context("failed to start echo server")?;

    info!("WebSocket server is running on ws://{}", server.local_addr());

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        shutdown.shutdown();
    });

    server.serve().await?;
    Ok(())
}
