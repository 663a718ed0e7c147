//! One-shot send command implementation.

use std::io::Write;
use std::time::Duration;

use relink::{spawn_ws_client, ClientHandle, ClientSettings, Payload};
use tokio::sync::mpsc;
use tracing::debug;

use super::{forwarding_handlers, Notice};
use crate::error::CliError;

/// Send command executor.
pub struct SendCommand {
    settings: ClientSettings,
    payload: String,
    timeout: Duration,
}

impl SendCommand {
    /// Create a new send command.
    #[must_use]
    pub fn new(settings: ClientSettings, payload: impl Into<String>, timeout: Duration) -> Self {
        Self {
            settings,
            payload: payload.into(),
            timeout,
        }
    }

    /// Connect, send the payload, and print the first message received
    /// after it.
    ///
    /// Messages the peer pushed before the send are skipped. The peer may
    /// still push an unsolicited message between the send and its reply, in
    /// which case that message is printed instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection does not open in time, the client
    /// gives up, the send fails, or no reply arrives in time.
    pub async fn execute<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let (tx, mut notices) = mpsc::unbounded_channel();
        let config = self.settings.clone().into_config(forwarding_handlers(tx))?;

        let (client, task) = spawn_ws_client();
        client.start(config).await?;

        let result = self.exchange(&client, &mut notices).await;

        client.shutdown().await?;
        let _ = task.await;

        let reply = result?;
        writeln!(writer, "{reply}")?;
        Ok(())
    }

    async fn exchange(
        &self,
        client: &ClientHandle,
        notices: &mut mpsc::UnboundedReceiver<Notice>,
    ) -> Result<Payload, CliError> {
        // Idle with an endpoint means the cycle ran and gave up.
        let opened = tokio::time::timeout(
            self.timeout,
            client.wait_for(|status| {
                status.is_open() || (status.is_idle() && status.endpoint.is_some())
            }),
        )
        .await
        .map_err(|_| CliError::Timeout(self.timeout, "connection"))??;

        if !opened.is_open() {
            return Err(CliError::GaveUp {
                attempts: opened.reconnect_attempts,
            });
        }

        let skipped = skip_pending(notices);
        if skipped > 0 {
            debug!(skipped, "ignoring messages received before send");
        }

        debug!(payload = %self.payload, "sending");
        client.send(self.payload.as_str()).await?;

        tokio::time::timeout(self.timeout, async {
            while let Some(notice) = notices.recv().await {
                if let Notice::Message(payload) = notice {
                    return Some(payload);
                }
            }
            None
        })
        .await
        .map_err(|_| CliError::Timeout(self.timeout, "reply"))?
        .ok_or(CliError::Client(relink::ClientError::Shutdown))
    }
}

/// Drop queued notices, returning how many were messages.
fn skip_pending(notices: &mut mpsc::UnboundedReceiver<Notice>) -> usize {
    let mut skipped = 0;
    while let Ok(notice) = notices.try_recv() {
        if matches!(notice, Notice::Message(_)) {
            skipped += 1;
        }
    }
    skipped
}
