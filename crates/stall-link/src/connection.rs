//! Websocket connection manager.
//!
//! Owns the single websocket session of a client and the reconnection
//! prompt. Socket I/O runs in a spawned session task that only turns frames
//! into [`SessionEvent`]s; all state changes happen in [`ConnectionManager::handle`],
//! called from the client's one event loop.
//!
//! ```text
//! Disconnected ──connect──► Connecting ──open──► Connected
//!      ▲                        │                    │
//!      │                      error                close
//!      │                        ▼                    │
//!      └────────close───────  Failed ◄───error───────┤
//!      └─────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use stall_common::Frame;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::Message, Error as WsError},
};
use tracing::{debug, info, warn};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 8090;

/// Notice surfaced to the operator when a connection fails.
pub const CONNECT_FAILED_NOTICE: &str = "Falha ao conectar, cheque o ip.";

/// How long `shutdown` waits for the session task to flush its close frame.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Errors that can occur on the link.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    #[error("not connected")]
    NotConnected,

    #[error("WebSocket connection failed: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    #[error("Connection timeout")]
    Timeout,

    #[error("Channel send error")]
    ChannelClosed,
}

/// Configuration for the connection manager.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Broker port; the host is supplied per `connect`.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Capacity of the session event channel.
    pub event_channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(10),
            event_channel_capacity: 256,
        }
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Failed => write!(f, "failed"),
        }
    }
}

/// What a session task reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Handshake completed.
    Opened,
    /// A data frame arrived.
    Frame(Frame),
    /// Connect or transport failure. Always followed by `Closed`.
    Error(String),
    /// The session is over.
    Closed,
}

/// A [`LinkEvent`] tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub session: u64,
    pub event: LinkEvent,
}

/// Side effects the host applies after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowPrompt,
    HidePrompt,
    /// User-visible notice.
    Notify(String),
    /// A frame to hand to the client's order logic.
    Inbound(Frame),
}

/// Outbound path for encoded orders.
///
/// The composer and the relay queue only ever transmit through this trait.
pub trait OrderSink {
    /// Transmit one text payload, fire-and-forget.
    fn send_text(&mut self, text: String) -> Result<(), LinkError>;
}

/// A live session: its id, write side and task.
struct Session {
    id: u64,
    endpoint: String,
    outbound: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

impl Session {
    /// Ask the task to send a close frame and stop.
    fn close(self) -> JoinHandle<()> {
        let _ = self.outbound.send(Message::Close(None));
        self.task
    }
}

/// Owns the client's websocket session.
pub struct ConnectionManager {
    config: LinkConfig,
    state: ConnectionState,
    prompt_visible: bool,
    next_session: u64,
    active: Option<Session>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl ConnectionManager {
    /// Create a manager and the receiver its sessions report on.
    pub fn new(config: LinkConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let manager = Self {
            config,
            state: ConnectionState::Disconnected,
            prompt_visible: true,
            next_session: 1,
            active: None,
            event_tx,
        };
        (manager, event_rx)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the reconnection prompt should be shown.
    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Endpoint of the current session, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.endpoint.as_str())
    }

    /// Build the websocket URL for `host` on the configured port.
    pub fn endpoint_for(&self, host: &str) -> Result<String, LinkError> {
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
            return Err(LinkError::InvalidHost(host.to_string()));
        }
        Ok(format!("ws://{}:{}", host, self.config.port))
    }

    /// Open a new session to `host`, discarding any previous one.
    pub fn connect(&mut self, host: &str) -> Result<(), LinkError> {
        let endpoint = self.endpoint_for(host)?;

        if let Some(previous) = self.active.take() {
            debug!("Discarding session {} to {}", previous.id, previous.endpoint);
            drop(previous.close());
        }

        let id = self.next_session;
        self.next_session += 1;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(
            id,
            endpoint.clone(),
            self.config.connect_timeout,
            outbound_rx,
            self.event_tx.clone(),
        ));

        info!("Connecting to {endpoint} (session {id})");
        self.active = Some(Session {
            id,
            endpoint,
            outbound,
            task,
        });
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Apply a session event and return the effects for the host.
    ///
    /// Events from sessions other than the active one are ignored.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        let active_id = self.active.as_ref().map(|s| s.id);
        if active_id != Some(event.session) {
            debug!("Ignoring event from stale session {}", event.session);
            return Vec::new();
        }

        match event.event {
            LinkEvent::Opened => {
                info!("WebSocket connection established");
                self.state = ConnectionState::Connected;
                self.prompt_visible = false;
                vec![Effect::HidePrompt]
            }
            LinkEvent::Frame(frame) => {
                if self.state == ConnectionState::Connected {
                    vec![Effect::Inbound(frame)]
                } else {
                    debug!("Dropping frame received while {}", self.state);
                    Vec::new()
                }
            }
            LinkEvent::Error(reason) => {
                warn!("WebSocket error: {reason}");
                self.state = ConnectionState::Failed;
                self.prompt_visible = true;
                vec![
                    Effect::Notify(CONNECT_FAILED_NOTICE.to_string()),
                    Effect::ShowPrompt,
                ]
            }
            LinkEvent::Closed => {
                info!("WebSocket connection closed");
                self.active = None;
                self.state = ConnectionState::Disconnected;
                self.prompt_visible = true;
                vec![Effect::ShowPrompt]
            }
        }
    }

    /// Send a text payload on the live session.
    pub fn send(&self, text: String) -> Result<(), LinkError> {
        match &self.active {
            Some(session) if self.state == ConnectionState::Connected => session
                .outbound
                .send(Message::Text(text))
                .map_err(|_| LinkError::ChannelClosed),
            _ => Err(LinkError::NotConnected),
        }
    }

    /// Close the live session locally.
    ///
    /// The close is not reported back as an event.
    pub fn close(&mut self) -> Vec<Effect> {
        match self.active.take() {
            Some(session) => {
                info!("Closing session {} to {}", session.id, session.endpoint);
                drop(session.close());
                self.state = ConnectionState::Disconnected;
                self.prompt_visible = true;
                vec![Effect::ShowPrompt]
            }
            None => Vec::new(),
        }
    }

    /// Close the live session and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(session) = self.active.take() {
            info!("Shutting down session {}", session.id);
            let mut task = session.close();
            if timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!("Session task did not stop in time, aborting");
                task.abort();
            }
        }
        self.state = ConnectionState::Disconnected;
    }
}

impl OrderSink for ConnectionManager {
    fn send_text(&mut self, text: String) -> Result<(), LinkError> {
        self.send(text)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(session) = self.active.take() {
            session.task.abort();
        }
    }
}

/// Drive one websocket session until it ends.
async fn run_session(
    id: u64,
    endpoint: String,
    connect_timeout: Duration,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: mpsc::Sender<SessionEvent>,
) {
    let emit = |event: LinkEvent| {
        let events = events.clone();
        async move {
            let _ = events.send(SessionEvent { session: id, event }).await;
        }
    };

    if let Err(e) = session_loop(&endpoint, connect_timeout, &mut outbound, &emit).await {
        emit(LinkEvent::Error(e.to_string())).await;
    }
    emit(LinkEvent::Closed).await;
}

async fn session_loop<F, Fut>(
    endpoint: &str,
    connect_timeout: Duration,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
    emit: &F,
) -> Result<(), LinkError>
where
    F: Fn(LinkEvent) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let (ws_stream, _response) = match timeout(connect_timeout, connect_async(endpoint)).await {
        Ok(Ok((stream, response))) => (stream, response),
        Ok(Err(e)) => return Err(LinkError::Connection(e.to_string())),
        Err(_) => return Err(LinkError::Timeout),
    };

    emit(LinkEvent::Opened).await;

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received text frame ({} bytes)", text.len());
                        emit(LinkEvent::Frame(Frame::Text(text))).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Received binary frame ({} bytes)", data.len());
                        emit(LinkEvent::Frame(Frame::Binary(data))).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("WebSocket closed by server: {:?}", frame);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(LinkError::WebSocket(e)),
                    None => return Ok(()),
                }
            }

            out = outbound.recv() => {
                match out {
                    Some(Message::Close(frame)) => {
                        let _ = write.send(Message::Close(frame)).await;
                        return Ok(());
                    }
                    Some(msg) => write.send(msg).await?,
                    None => {
                        let _ = write.close().await;
                        return Ok(());
                    }
                }
            }
        }
    }
}
