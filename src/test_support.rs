//! Loopback backend and recording handler for tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing_subscriber::EnvFilter;

use crate::address::Address;
use crate::error::Error;
use crate::protocol::{Message, decode};
use crate::transport::{ConnectionHandler, SharedHandler};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any single expected event.
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Window in which no further event may arrive.
const QUIET_WINDOW: Duration = Duration::from_millis(200);

// ============================================================================
// Helpers
// ============================================================================

/// Installs a test subscriber once; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Resolver that never yields an address.
pub(crate) fn no_address() -> Option<Address> {
    None
}

/// Polls `condition` until it holds or the event timeout expires.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Builds a message from a JSON object literal.
pub(crate) fn message(value: Value) -> Message {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object literal, got {other}"),
    }
}

// ============================================================================
// TestPeer
// ============================================================================

/// Loopback WebSocket backend accepting any number of clients.
pub(crate) struct TestPeer {
    port: u16,
    accepted: mpsc::UnboundedReceiver<RemoteEnd>,
}

impl TestPeer {
    /// Binds to a random localhost port and starts accepting.
    pub(crate) async fn bind() -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, accepted) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await
                    && tx.send(RemoteEnd { ws }).is_err()
                {
                    break;
                }
            }
        });

        Self { port, accepted }
    }

    /// Returns an address on which nothing listens.
    pub(crate) async fn unused_address() -> Address {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Address::parse(&format!("ws://127.0.0.1:{port}/")).unwrap()
    }

    /// Returns the backend address.
    pub(crate) fn address(&self) -> Address {
        Address::parse(&format!("ws://127.0.0.1:{}/", self.port)).unwrap()
    }

    /// Waits for the next client connection.
    pub(crate) async fn accept(&mut self) -> RemoteEnd {
        timeout(EVENT_TIMEOUT, self.accepted.recv())
            .await
            .expect("client did not connect")
            .expect("accept loop stopped")
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// Server side of one accepted connection.
pub(crate) struct RemoteEnd {
    ws: WebSocketStream<TcpStream>,
}

impl RemoteEnd {
    pub(crate) async fn send(&mut self, frame: WsMessage) {
        self.ws.send(frame).await.unwrap();
    }

    pub(crate) async fn send_text(&mut self, text: &str) {
        self.send(WsMessage::Text(text.into())).await;
    }

    /// Reads the next frame of any kind.
    pub(crate) async fn next_frame(&mut self) -> Option<WsMessage> {
        timeout(EVENT_TIMEOUT, self.ws.next())
            .await
            .expect("no frame from client")
            .and_then(|frame| frame.ok())
    }

    /// Reads the next text frame as a message, skipping control frames.
    pub(crate) async fn next_message(&mut self) -> Message {
        loop {
            match self.next_frame().await {
                Some(WsMessage::Text(text)) => return decode(text.as_str()).unwrap(),
                Some(WsMessage::Ping(_)) | Some(WsMessage::Pong(_)) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    /// Reads until a close frame arrives and returns its payload.
    pub(crate) async fn expect_close(&mut self) -> Option<CloseFrame> {
        loop {
            match self.next_frame().await {
                Some(WsMessage::Close(frame)) => return frame,
                Some(_) => continue,
                None => panic!("stream ended without close frame"),
            }
        }
    }

    /// Drops the socket without a closing handshake.
    pub(crate) fn abort(self) {
        drop(self.ws);
    }
}

// ============================================================================
// RecordingHandler
// ============================================================================

/// A handler event as observed by a test.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Opened,
    Message(Message),
    Error(String),
    Closed(i32, Option<String>),
}

/// Handler that forwards every callback into a channel.
pub(crate) struct RecordingHandler {
    tx: mpsc::UnboundedSender<Recorded>,
    rx: Mutex<mpsc::UnboundedReceiver<Recorded>>,
}

impl RecordingHandler {
    pub(crate) fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            tx,
            rx: Mutex::new(rx),
        })
    }

    /// Waits for the next recorded event.
    pub(crate) async fn next(&self) -> Recorded {
        let mut rx = self.rx.lock().await;
        timeout(EVENT_TIMEOUT, rx.recv())
            .await
            .expect("handler event did not arrive")
            .expect("recording channel closed")
    }

    /// Asserts that no event arrives within a short window.
    pub(crate) async fn assert_quiet(&self) {
        let mut rx = self.rx.lock().await;
        if let Ok(Some(event)) = timeout(QUIET_WINDOW, rx.recv()).await {
            panic!("unexpected handler event: {event:?}");
        }
    }

    fn record(&self, event: Recorded) {
        let _ = self.tx.send(event);
    }
}

/// Extension for handing the recorder to a transport or supervisor.
pub(crate) trait SharedRecorder {
    fn shared(&self) -> SharedHandler;
}

impl SharedRecorder for Arc<RecordingHandler> {
    fn shared(&self) -> SharedHandler {
        Arc::clone(self) as SharedHandler
    }
}

impl ConnectionHandler for RecordingHandler {
    fn on_opened(&self) {
        self.record(Recorded::Opened);
    }

    fn on_message(&self, message: Message) {
        self.record(Recorded::Message(message));
    }

    fn on_error(&self, cause: &Error) {
        self.record(Recorded::Error(cause.to_string()));
    }

    fn on_closed(&self, code: i32, reason: Option<&str>) {
        self.record(Recorded::Closed(code, reason.map(str::to_owned)));
    }
}
