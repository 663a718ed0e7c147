//! Async driver for a [`ReconnectingSocketClient`].
//!
//! The driver task owns the client and serializes everything that touches
//! it: host commands arriving through a [`ClientHandle`] and events arriving
//! from the transport and timer. After each step it publishes a
//! [`ClientStatus`] snapshot on a watch channel.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::ReconnectingSocketClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::event::{event_channel, EventReceiver, Payload};
use crate::state::ClientStatus;
use crate::timer::{Scheduler, TokioScheduler};
use crate::transport::Transport;
use crate::ws::WsTransport;

/// Capacity of the host command queue.
pub const COMMAND_BUFFER: usize = 32;

/// A request from the host to the driver.
pub enum ClientCommand {
    /// Begin a new cycle.
    Start(ClientConfig),
    /// Stop the current cycle.
    Stop,
    /// Send a payload and report the outcome.
    Send {
        /// Payload to send.
        payload: Payload,
        /// Where to report the result.
        reply: oneshot::Sender<ClientResult<()>>,
    },
    /// Stop and exit the driver.
    Shutdown,
}

impl std::fmt::Debug for ClientCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start(config) => f.debug_tuple("Start").field(&config.endpoint).finish(),
            Self::Stop => f.write_str("Stop"),
            Self::Send { payload, .. } => f.debug_struct("Send").field("payload", payload).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Runs a client against its command and event queues.
pub struct ClientDriver<T: Transport, S: Scheduler> {
    client: ReconnectingSocketClient<T, S>,
    commands: mpsc::Receiver<ClientCommand>,
    events: EventReceiver,
    status: watch::Sender<ClientStatus>,
}

impl<T: Transport, S: Scheduler> ClientDriver<T, S> {
    /// Create a driver and the handle that controls it.
    ///
    /// `events` must be the receiving end of the queue the client's
    /// transport and scheduler deliver into.
    #[must_use]
    pub fn new(client: ReconnectingSocketClient<T, S>, events: EventReceiver) -> (Self, ClientHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(client.status());

        let driver = Self {
            client,
            commands: command_rx,
            events,
            status: status_tx,
        };
        let handle = ClientHandle {
            commands: command_tx,
            status: status_rx,
        };
        (driver, handle)
    }

    /// Process commands and events until shutdown or until every handle is
    /// dropped. The client is stopped on the way out.
    pub async fn run(mut self) {
        debug!("client driver started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ClientCommand::Start(config)) => self.client.start(config),
                    Some(ClientCommand::Stop) => self.client.stop(),
                    Some(ClientCommand::Send { payload, reply }) => {
                        let _ = reply.send(self.client.send(payload));
                    }
                    Some(ClientCommand::Shutdown) | None => break,
                },
                Some(event) = self.events.recv() => self.client.dispatch(event),
            }

            self.publish();
        }

        self.client.stop();
        self.publish();
        info!("client driver stopped");
    }

    fn publish(&self) {
        let next = self.client.status();
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Cloneable host-side control for a running driver.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<ClientCommand>,
    status: watch::Receiver<ClientStatus>,
}

impl ClientHandle {
    /// Begin a new cycle with `config`, tearing down any current one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Shutdown`] if the driver has exited.
    pub async fn start(&self, config: ClientConfig) -> ClientResult<()> {
        self.command(ClientCommand::Start(config)).await
    }

    /// Stop the current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Shutdown`] if the driver has exited.
    pub async fn stop(&self) -> ClientResult<()> {
        self.command(ClientCommand::Stop).await
    }

    /// Send a payload on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] if the connection is not open,
    /// [`ClientError::Transport`] if the transport refuses it, or
    /// [`ClientError::Shutdown`] if the driver has exited.
    pub async fn send(&self, payload: impl Into<Payload>) -> ClientResult<()> {
        let (reply, result) = oneshot::channel();
        self.command(ClientCommand::Send {
            payload: payload.into(),
            reply,
        })
        .await?;
        result.await.map_err(|_| ClientError::Shutdown)?
    }

    /// Stop the client and end the driver task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Shutdown`] if the driver has already exited.
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.command(ClientCommand::Shutdown).await
    }

    /// The most recently published status.
    #[must_use]
    pub fn status(&self) -> ClientStatus {
        self.status.borrow().clone()
    }

    /// A receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClientStatus> {
        self.status.clone()
    }

    /// Wait until the published status satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Shutdown`] if the driver exits first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ClientStatus) -> bool,
    ) -> ClientResult<ClientStatus> {
        let mut status = self.status.clone();
        let matched = status
            .wait_for(predicate)
            .await
            .map_err(|_| ClientError::Shutdown)?;
        Ok(matched.clone())
    }

    async fn command(&self, command: ClientCommand) -> ClientResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::Shutdown)
    }
}

/// Spawn a driver for `client` on the current runtime.
pub fn spawn_client<T, S>(
    client: ReconnectingSocketClient<T, S>,
    events: EventReceiver,
) -> (ClientHandle, JoinHandle<()>)
where
    T: Transport + Send + 'static,
    T::Handle: Send,
    S: Scheduler + Send + 'static,
    S::Timer: Send,
{
    let (driver, handle) = ClientDriver::new(client, events);
    let task = tokio::spawn(driver.run());
    (handle, task)
}

/// Spawn a WebSocket client driven by tokio timers.
#[must_use]
pub fn spawn_ws_client() -> (ClientHandle, JoinHandle<()>) {
    let (event_tx, event_rx) = event_channel();
    let client = ReconnectingSocketClient::new(
        WsTransport::new(event_tx.clone()),
        TokioScheduler::new(event_tx),
    );
    spawn_client(client, event_rx)
}
