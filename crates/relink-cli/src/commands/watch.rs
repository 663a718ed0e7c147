//! Watch command implementation.
//!
//! Keeps a client running against the endpoint and prints every callback
//! until interrupted or until the client gives up.

use std::future::Future;
use std::io::Write;

use relink::{spawn_ws_client, ClientError, ClientSettings};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{forwarding_handlers, Notice};
use crate::error::CliError;

/// Watch command executor.
pub struct WatchCommand {
    settings: ClientSettings,
}

impl WatchCommand {
    /// Create a new watch command.
    #[must_use]
    pub const fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    /// Run until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::GaveUp`] if the client goes idle, or an error if
    /// the settings are invalid or output fails.
    pub async fn execute<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        self.execute_until(writer, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `interrupt` completes.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_until<W, F>(&self, writer: &mut W, interrupt: F) -> Result<(), CliError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let (tx, mut notices) = mpsc::unbounded_channel();
        let config = self.settings.clone().into_config(forwarding_handlers(tx))?;

        let (client, task) = spawn_ws_client();
        let mut status = client.subscribe();
        client.start(config).await?;
        info!(endpoint = %self.settings.endpoint, "watching");

        tokio::pin!(interrupt);
        let outcome = loop {
            tokio::select! {
                Some(notice) = notices.recv() => print_notice(writer, &notice)?,
                changed = status.changed() => {
                    if changed.is_err() {
                        break Err(ClientError::Shutdown.into());
                    }
                    let current = status.borrow_and_update().clone();
                    if current.is_idle() {
                        break Err(CliError::GaveUp {
                            attempts: current.reconnect_attempts,
                        });
                    }
                },
                () = &mut interrupt => {
                    info!("interrupted, stopping");
                    break Ok(());
                }
            }
        };

        // Flush callbacks that raced the final status.
        while let Ok(notice) = notices.try_recv() {
            print_notice(writer, &notice)?;
        }

        client.shutdown().await?;
        let _ = task.await;
        outcome
    }
}

fn print_notice<W: Write>(writer: &mut W, notice: &Notice) -> Result<(), CliError> {
    writeln!(writer, "{notice}")?;
    writer.flush()?;
    Ok(())
}
