//! # Hub Server Module
//!
//! The HTTP/WebSocket server: the JSON API plus the `/ws` relay that fans
//! local-bus changes out to controller sessions.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hub Architecture                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      HubServer (Axum)                           │   │
//! │  │                                                                 │   │
//! │  │  /facilities/... ──▶ api::router (ConfigService)               │   │
//! │  │  /ws             ──▶ WebSocket upgrade                          │   │
//! │  │                        │                                        │   │
//! │  │                        ▼                                        │   │
//! │  │              ┌─────────────────┐                                │   │
//! │  │              │  Session task   │ ◀── one per controller         │   │
//! │  │              │  topic filter   │                                │   │
//! │  │              └────────┬────────┘                                │   │
//! │  │                       │ LocalBus subscription                   │   │
//! │  │         ┌─────────────┼─────────────┐                          │   │
//! │  │         ▼             ▼             ▼                          │   │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐                      │   │
//! │  │  │ ZTL scope│  │ ZJX scope│  │ A80 scope│   Controller         │   │
//! │  │  └──────────┘  └──────────┘  └──────────┘   sessions           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Message Flow:                                                          │
//! │  ─────────────                                                          │
//! │  1. Session sends Subscribe { topics }                                 │
//! │  2. Hub replies Snapshot per topic (read under the topic's write lock) │
//! │  3. Hub relays Change for every later publish on those topics          │
//! │  4. Hub pings every 30s; sessions may send Ping for an app-level Pong  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribing to the bus happens before the snapshot read, and the snapshot
//! is enqueued while writers for that topic are held off. A session can see
//! the same value twice, never an older value after a newer one.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use radar_core::parse_topic;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::api;
use crate::config::HubSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{ClientMessage, HubMessage};
use crate::service::ConfigService;
use crate::transport::LocalBus;

// =============================================================================
// Constants
// =============================================================================

/// Ping interval to keep connections alive.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum inbound message size (64KB). Sessions only send subscriptions.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Outgoing messages buffered per session.
const OUTGOING_BUFFER: usize = 64;

// =============================================================================
// Hub State
// =============================================================================

/// Shared state for `/ws` sessions.
pub struct HubState {
    service: ConfigService,
    bus: LocalBus,
    sessions: AtomicUsize,
}

impl HubState {
    /// Creates hub state relaying `bus` events, with snapshots from `service`.
    pub fn new(service: ConfigService, bus: LocalBus) -> Self {
        HubState {
            service,
            bus,
            sessions: AtomicUsize::new(0),
        }
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }
}

/// Builds the `/ws` router.
pub fn router(state: Arc<HubState>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

// =============================================================================
// Hub Server
// =============================================================================

/// The HTTP/WebSocket server.
pub struct HubServer {
    config: HubSettings,
    service: ConfigService,
    /// None when notifications go out over Redis; `/ws` is then not served.
    bus: Option<LocalBus>,
}

/// Handle for controlling a running hub server.
#[derive(Clone)]
pub struct HubHandle {
    local_addr: SocketAddr,
    state: Option<Arc<HubState>>,
    shutdown_tx: mpsc::Sender<()>,
}

impl HubHandle {
    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of open `/ws` sessions.
    pub fn session_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.session_count())
    }

    /// Shuts down the server.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::Internal("Hub shutdown channel closed".into()))
    }
}

impl HubServer {
    /// Creates a new hub server.
    pub fn new(config: HubSettings, service: ConfigService, bus: Option<LocalBus>) -> Self {
        HubServer {
            config,
            service,
            bus,
        }
    }

    /// Binds the listener, starts serving, and returns a handle.
    pub async fn start(self) -> SyncResult<HubHandle> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut app = api::router(self.service.clone());
        let state = self.bus.map(|bus| Arc::new(HubState::new(self.service, bus)));
        if let Some(ref state) = state {
            app = app.merge(router(state.clone()));
        }

        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| SyncError::Config(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, relay = state.is_some(), "Hub server started");

        tokio::spawn(async move {
            let served = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_rx.recv().await;
                info!("Hub server shutting down");
            })
            .await;

            if let Err(e) = served {
                warn!(error = %e, "Hub server exited with error");
            }
        });

        Ok(HubHandle {
            local_addr,
            state,
            shutdown_tx,
        })
    }
}

// =============================================================================
// WebSocket Handler
// =============================================================================

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<HubState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    info!(addr = %addr, "New WebSocket session");
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// Runs one session until the peer goes away.
async fn handle_socket(socket: WebSocket, state: Arc<HubState>, addr: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    state.sessions.fetch_add(1, Ordering::Relaxed);

    let topics: Arc<RwLock<HashSet<String>>> = Arc::new(RwLock::new(HashSet::new()));
    let mut events = state.bus.subscribe();

    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(OUTGOING_BUFFER);

    // Outgoing message task
    let outgoing_handle = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Change forwarding task
    let forward_topics = topics.clone();
    let forward_tx = outgoing_tx.clone();
    let forward_handle = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if !forward_topics.read().await.contains(&event.topic) {
                continue;
            }
            if send_message(&forward_tx, &HubMessage::change(event)).await.is_err() {
                break;
            }
        }
    });

    // Ping task
    let ping_tx = outgoing_tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_interval = interval(PING_INTERVAL);
        loop {
            ping_interval.tick().await;
            if ping_tx.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                break;
            }
        }
    });

    // Main receive loop
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => match ClientMessage::from_json(text.as_str()) {
                Ok(msg) => {
                    if handle_client_message(&state, &topics, &outgoing_tx, msg)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    debug!(addr = %addr, error = %e, "Invalid message format");
                    let reply = HubMessage::error(format!("Invalid message: {}", e));
                    if send_message(&outgoing_tx, &reply).await.is_err() {
                        break;
                    }
                }
            },
            Some(Ok(Message::Binary(_))) => {
                let reply = HubMessage::error("Binary messages are not supported");
                if send_message(&outgoing_tx, &reply).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Ping(data))) => {
                let _ = outgoing_tx.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Pong(_))) => {
                // Connection is alive
            }
            Some(Ok(Message::Close(_))) => {
                info!(addr = %addr, "Session requested close");
                break;
            }
            Some(Err(e)) => {
                warn!(addr = %addr, error = %e, "WebSocket error");
                break;
            }
            None => {
                info!(addr = %addr, "Session disconnected");
                break;
            }
        }
    }

    // Cleanup
    ping_handle.abort();
    forward_handle.abort();
    outgoing_handle.abort();
    state.sessions.fetch_sub(1, Ordering::Relaxed);
}

/// Serializes and enqueues a hub message.
async fn send_message(tx: &mpsc::Sender<Message>, msg: &HubMessage) -> SyncResult<()> {
    let json = msg.to_json()?;
    tx.send(Message::Text(json.into()))
        .await
        .map_err(|_| SyncError::Internal("Session closed".into()))
}

/// Handles one session request. Errors mean the session is gone.
async fn handle_client_message(
    state: &HubState,
    topics: &RwLock<HashSet<String>>,
    outgoing: &mpsc::Sender<Message>,
    msg: ClientMessage,
) -> SyncResult<()> {
    match msg {
        ClientMessage::Subscribe { topics: requested } => {
            for topic in requested {
                if let Err(e) = parse_topic(&topic) {
                    send_message(outgoing, &HubMessage::error(e.to_string())).await?;
                    continue;
                }

                topics.write().await.insert(topic.clone());

                // Reserve before the snapshot takes the key lock, so the lock
                // is never held across a wait on this session
                let permit = outgoing
                    .reserve()
                    .await
                    .map_err(|_| SyncError::Internal("Session closed".into()))?;

                match state.service.snapshot(&topic).await {
                    Ok(snapshot) => {
                        let json = HubMessage::snapshot(snapshot.event.clone()).to_json()?;
                        permit.send(Message::Text(json.into()));
                        drop(snapshot);
                        debug!(topic = %topic, "Session subscribed");
                    }
                    Err(e) => {
                        topics.write().await.remove(&topic);
                        let reply =
                            HubMessage::error(format!("Cannot subscribe to {}: {}", topic, e));
                        permit.send(Message::Text(reply.to_json()?.into()));
                    }
                }
            }
        }
        ClientMessage::Unsubscribe { topics: requested } => {
            let mut current = topics.write().await;
            for topic in &requested {
                current.remove(topic);
            }
        }
        ClientMessage::Ping => {
            send_message(outgoing, &HubMessage::Pong).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;
    use radar_core::{Facility, LineLimits};
    use tokio_tungstenite::{connect_async, tungstenite};

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start_hub() -> (HubHandle, ConfigService, Facility) {
        let ztl = Facility::new("ZTL").with_split_assignments(["North", "South"]);
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let bus = LocalBus::new(64);
        let service = ConfigService::new(
            store.clone(),
            store,
            Arc::new(bus.clone()),
            LineLimits::default(),
        );

        let settings = HubSettings {
            port: 0,
            bind_addr: "127.0.0.1".into(),
        };
        let handle = HubServer::new(settings, service.clone(), Some(bus))
            .start()
            .await
            .unwrap();
        (handle, service, ztl)
    }

    async fn send(client: &mut Client, msg: &ClientMessage) {
        let json = serde_json::to_string(msg).unwrap();
        client.send(tungstenite::Message::text(json)).await.unwrap();
    }

    async fn next_hub_message(client: &mut Client) -> HubMessage {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let tungstenite::Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_subscribe_snapshot_then_change() {
        let (handle, service, ztl) = start_hub().await;
        let url = format!("ws://{}/ws", handle.local_addr());
        let (mut client, _) = connect_async(url).await.unwrap();

        send(
            &mut client,
            &ClientMessage::Subscribe {
                topics: vec!["ZTL-radar-split".into()],
            },
        )
        .await;

        assert_eq!(
            next_hub_message(&mut client).await,
            HubMessage::Snapshot {
                topic: "ZTL-radar-split".into(),
                lines: vec!["North".into(), "South".into()],
            }
        );

        // Not subscribed: must not be relayed
        service
            .update_notices(&ztl.id, vec!["TFR in effect".into()])
            .await
            .unwrap();
        service
            .update_split(&ztl.id, vec!["North".into(), "South".into(), "East".into()])
            .await
            .unwrap();

        assert_eq!(
            next_hub_message(&mut client).await,
            HubMessage::Change {
                topic: "ZTL-radar-split".into(),
                lines: vec!["North".into(), "South".into(), "East".into()],
            }
        );

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_requests_keep_session_open() {
        let (handle, _service, _ztl) = start_hub().await;
        let url = format!("ws://{}/ws", handle.local_addr());
        let (mut client, _) = connect_async(url).await.unwrap();

        send(
            &mut client,
            &ClientMessage::Subscribe {
                topics: vec!["ZTL-weather".into(), "ZZZ-notam".into()],
            },
        )
        .await;
        assert!(matches!(next_hub_message(&mut client).await, HubMessage::Error { .. }));
        assert!(matches!(next_hub_message(&mut client).await, HubMessage::Error { .. }));

        client
            .send(tungstenite::Message::text("not json"))
            .await
            .unwrap();
        assert!(matches!(next_hub_message(&mut client).await, HubMessage::Error { .. }));

        send(&mut client, &ClientMessage::Ping).await;
        assert_eq!(next_hub_message(&mut client).await, HubMessage::Pong);
        assert_eq!(handle.session_count(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stalled_session_does_not_block_writers() {
        let ztl = Facility::new("ZTL").with_split_assignments(["North"]);
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let bus = LocalBus::new(8);
        let service = ConfigService::new(
            store.clone(),
            store,
            Arc::new(bus.clone()),
            LineLimits::default(),
        );
        let state = Arc::new(HubState::new(service.clone(), bus));

        // A session whose queue is full and never drained
        let (outgoing_tx, _outgoing_rx) = mpsc::channel::<Message>(1);
        outgoing_tx
            .send(Message::Text("queued".to_string().into()))
            .await
            .unwrap();

        let subscriber = {
            let state = state.clone();
            tokio::spawn(async move {
                let topics = RwLock::new(HashSet::new());
                let msg = ClientMessage::Subscribe {
                    topics: vec!["ZTL-radar-split".into()],
                };
                let _ = handle_client_message(&state, &topics, &outgoing_tx, msg).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            service.update_split(&ztl.id, vec!["South".into()]),
        )
        .await
        .expect("update waited on a stalled session")
        .unwrap();
        assert!(outcome.is_published());
        assert_eq!(outcome.facility().split_assignments, vec!["South"]);

        subscriber.abort();
    }

    #[tokio::test]
    async fn test_api_served_without_relay() {
        let ztl = Facility::new("ZTL");
        let store = Arc::new(MemoryConfigStore::from_iter([ztl]));
        let service = ConfigService::new(
            store.clone(),
            store,
            Arc::new(LocalBus::new(4)),
            LineLimits::default(),
        );
        let settings = HubSettings {
            port: 0,
            bind_addr: "127.0.0.1".into(),
        };
        let handle = HubServer::new(settings, service, None).start().await.unwrap();

        let url = format!("ws://{}/ws", handle.local_addr());
        assert!(connect_async(url).await.is_err());
        assert_eq!(handle.session_count(), 0);

        handle.shutdown().await.unwrap();
    }
}
