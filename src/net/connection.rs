//! Match Connection: one live socket per match room.
//!
//! `MatchConnection::open` spawns a task that owns the transport to
//! `<ws_url>/<matchID>/ws`, applies every inbound frame to the shared store,
//! and forwards queued outbound messages. When the socket closes or fails to
//! open, the task reconnects according to the [`ReconnectPolicy`] and never
//! gives up; only [`MatchConnection::close`] (or dropping the handle) ends it.
//!
//! ERROR HANDLING
//! ==============
//! Undecodable frames and protocol errors are logged and dropped. Transport
//! errors end the current socket and go through the reconnect loop.
//! Messages queued while disconnected go out on the next socket.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use frames::{ClientMessage, PlayerEventKind, PostMove};
use rand::Rng;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::config::{ClientConfig, DEFAULT_RECONNECT_INITIAL_MS, DEFAULT_RECONNECT_MAX_MS};
use crate::net::dispatch::dispatch_message;
use crate::state::match_state::MatchState;

/// Store shared between the connection task and readers.
pub type SharedState = Arc<Mutex<MatchState>>;

pub type FrameSink = Pin<Box<dyn Sink<String, Error = ConnectionError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ConnectionError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("socket closed")]
    Closed,
    #[error("connection task has stopped")]
    TaskGone,
}

impl From<tokio_tungstenite::tungstenite::Error> for ConnectionError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}

/// How long to wait between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Reconnect at once; the attempt counter is only logged.
    Immediate,
    /// Capped exponential backoff with jitter, reset after a successful connect.
    Backoff { initial: Duration, max: Duration },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Backoff {
            initial: Duration::from_millis(DEFAULT_RECONNECT_INITIAL_MS),
            max: Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
        }
    }
}

impl ReconnectPolicy {
    /// Un-jittered delay before reconnect attempt `attempt` (1-based).
    #[must_use]
    pub fn nominal_delay(self, attempt: u32) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Backoff { initial, max } => {
                let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    /// Delay drawn uniformly from `[nominal / 2, nominal]`.
    #[must_use]
    pub fn delay(self, attempt: u32) -> Duration {
        let nominal = self.nominal_delay(attempt);
        if nominal.is_zero() {
            return nominal;
        }
        let half = nominal / 2;
        let spread = u64::try_from(nominal.saturating_sub(half).as_millis()).unwrap_or(u64::MAX);
        half + Duration::from_millis(rand::rng().random_range(0..=spread))
    }
}

/// Both halves of one open socket, carrying text frames.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens sockets. The seam between the connection loop and the network.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Transport, ConnectionError>;
}

/// Real WebSocket connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Transport, ConnectionError> {
        let (socket, _) = tokio_tungstenite::connect_async(url).await?;
        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(ConnectionError::from)
            .with(|text: String| async move { Ok::<_, ConnectionError>(Message::Text(text.into())) });
        let stream = stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(ConnectionError::from(e))),
            }
        });

        Ok(Transport { sink: Box::pin(sink), stream: Box::pin(stream) })
    }
}

/// Handle to a running match connection.
pub struct MatchConnection {
    match_id: String,
    store: SharedState,
    changes: watch::Receiver<u64>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MatchConnection {
    /// Start the connection task for `match_id`. Must be called inside a Tokio runtime.
    pub fn open(match_id: &str, config: &ClientConfig, store: SharedState, connector: impl Connector) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (changes_tx, changes) = watch::channel(0_u64);

        let worker = Worker {
            match_id: match_id.to_owned(),
            url: config.match_socket_url(match_id),
            policy: config.reconnect,
            store: Arc::clone(&store),
            changes: changes_tx,
            outbound: outbound_rx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(worker.run(connector));

        Self { match_id: match_id.to_owned(), store, changes, outbound, shutdown, task }
    }

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    #[must_use]
    pub fn store(&self) -> SharedState {
        Arc::clone(&self.store)
    }

    /// Receiver that observes the store's `rev` after every applied frame.
    /// Only changes after this call count as unseen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        let mut changes = self.changes.clone();
        drop(changes.borrow_and_update());
        changes
    }

    /// Queue a message for the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] after the connection has stopped.
    pub fn send(&self, message: ClientMessage) -> Result<(), ConnectionError> {
        self.outbound.send(message).map_err(|_| ConnectionError::TaskGone)
    }

    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] after the connection has stopped.
    pub fn submit_move(&self, post: PostMove) -> Result<(), ConnectionError> {
        tracing::debug!(match_id = %self.match_id, from = post.piece, to = post.to, "submitting move");
        self.send(ClientMessage::PostMove(post))
    }

    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] after the connection has stopped.
    pub fn send_event(&self, kind: PlayerEventKind) -> Result<(), ConnectionError> {
        self.send(ClientMessage::event(kind))
    }

    /// Tear down: signal shutdown, then wait for the task to finish.
    /// No reconnect is attempted afterwards.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(match_id = %self.match_id, error = %e, "connection task ended abnormally");
        }
    }
}

enum SocketEnd {
    Shutdown,
    Lost(Option<ConnectionError>),
}

struct Worker {
    match_id: String,
    url: String,
    policy: ReconnectPolicy,
    store: SharedState,
    changes: watch::Sender<u64>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self, connector: impl Connector) {
        let mut attempt: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                result = connector.connect(&self.url) => result,
            };

            match connected {
                Ok(transport) => {
                    attempt = 0;
                    tracing::info!(match_id = %self.match_id, url = %self.url, "match socket connected");
                    match self.pump(transport).await {
                        SocketEnd::Shutdown => break,
                        SocketEnd::Lost(Some(e)) => {
                            tracing::warn!(match_id = %self.match_id, error = %e, "match socket lost");
                        }
                        SocketEnd::Lost(None) => {
                            tracing::info!(match_id = %self.match_id, "match socket closed by server");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(match_id = %self.match_id, url = %self.url, error = %e, "match socket connect failed");
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = self.policy.delay(attempt);
            tracing::info!(
                match_id = %self.match_id,
                attempt,
                backoff_ms = u64::try_from(self.policy.nominal_delay(attempt).as_millis()).unwrap_or(u64::MAX),
                "reconnecting"
            );

            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!(match_id = %self.match_id, "match connection stopped");
    }

    async fn pump(&mut self, transport: Transport) -> SocketEnd {
        let Transport { mut sink, mut stream } = transport;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => {
                    let _ = sink.close().await;
                    return SocketEnd::Shutdown;
                }
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.apply_frame(&text).await,
                    Some(Err(e)) => return SocketEnd::Lost(Some(e)),
                    None => return SocketEnd::Lost(None),
                },
                message = self.outbound.recv() => match message {
                    Some(message) => {
                        if let Err(e) = sink.send(frames::encode_message(&message)).await {
                            tracing::warn!(match_id = %self.match_id, error = %e, "send failed");
                            return SocketEnd::Lost(Some(e));
                        }
                    }
                    // Every handle is gone.
                    None => return SocketEnd::Shutdown,
                },
            }
        }
    }

    async fn apply_frame(&self, text: &str) {
        let mut state = self.store.lock().await;
        let mut changed = false;
        for decoded in frames::decode_batch(text) {
            match decoded {
                Ok(message) => changed |= dispatch_message(message, &mut state),
                Err(e) => tracing::warn!(match_id = %self.match_id, error = %e, "dropping undecodable message"),
            }
        }
        if changed {
            self.changes.send_replace(state.rev());
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
