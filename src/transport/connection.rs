//! WebSocket transport and its I/O event loop.
//!
//! A [`Transport`] is one physical connection, created fresh for every
//! connection attempt and discarded once it terminates.
//!
//! # Lifecycle
//!
//! ```text
//! connect() ──► dialing ──► established ──► terminated
//!                  │                            ▲
//!                  └── on_error (connect) ──────┘
//! ```
//!
//! # Event Loop
//!
//! Once established, the transport spawns a tokio task that owns the
//! socket and handles:
//!
//! - Incoming frames (text messages, close frames)
//! - Scheduled flushes of the [`OutboundQueue`]
//! - Keepalive pings
//! - Local close requests
//!
//! All socket writes happen on that task, so a ping never interleaves with
//! a flush batch. Exactly one terminal callback (`on_error` or `on_closed`)
//! is delivered per transport.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, info, trace, warn};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::protocol::frame::{Inbound, normal_close};
use crate::protocol::{Message, NO_STATUS_CODE, encode};

use super::handler::SharedHandler;
use super::options::TransportOptions;
use super::queue::OutboundQueue;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

/// Source of process-unique transport ids.
static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// TransportId
// ============================================================================

/// Process-unique identity of one transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(u64);

impl TransportId {
    fn next() -> Self {
        Self(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport-{}", self.0)
    }
}

// ============================================================================
// TransportCommand
// ============================================================================

/// Work scheduled onto the event loop.
enum TransportCommand {
    /// Drain the outbound queue.
    Flush,
    /// Send a keepalive ping.
    Ping,
    /// Close gracefully without notifying the handler.
    Close,
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between the transport handle and its event loop.
struct Shared {
    id: TransportId,
    address: Address,
    handler: SharedHandler,
    queue: OutboundQueue,
    /// Set once by whichever terminal path fires first.
    terminated: AtomicBool,
}

impl Shared {
    /// Claims the single terminal transition.
    #[inline]
    fn terminate(&self) -> bool {
        !self.terminated.swap(true, Ordering::AcqRel)
    }

    #[inline]
    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn closed_by_peer(&self, code: i32, reason: Option<&str>) {
        if self.terminate() {
            debug!(id = %self.id, code, reason, "Backend closed connection");
            self.handler.on_closed(code, reason);
        }
    }

    async fn failed(&self, cause: Error, ws_write: &mut WsSink, write_timeout: Duration) {
        if !self.terminate() {
            return;
        }

        warn!(id = %self.id, error = %cause, "Backend connection failed");
        self.handler.on_error(&cause);

        let _ = timeout(write_timeout, async {
            let _ = ws_write.send(WsMessage::Close(None)).await;
            let _ = ws_write.close().await;
        })
        .await;
    }
}

// ============================================================================
// Transport
// ============================================================================

/// One WebSocket connection to the backend.
///
/// # Thread Safety
///
/// `Transport` is `Send + Sync`. [`send`](Self::send), [`ping`](Self::ping)
/// and [`close`](Self::close) never block; they only schedule work onto
/// the event loop.
pub struct Transport {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<TransportCommand>,
}

impl Transport {
    /// Starts a connection attempt.
    ///
    /// The address is validated before any I/O. The returned future
    /// performs the handshake; on success the handler's `on_opened` fires
    /// before the future resolves, on failure `on_error` fires and the
    /// future resolves to the same error.
    ///
    /// The future must be polled inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] synchronously if the scheme is not
    /// `ws`/`wss`, the address has no host, or the options are invalid.
    pub fn connect(
        address: Address,
        handler: SharedHandler,
        options: TransportOptions,
    ) -> Result<impl Future<Output = Result<Transport>> + Send + 'static> {
        let scheme = address.scheme()?;
        if address.host().is_none() {
            return Err(Error::config(format!("Backend address has no host: {address}")));
        }
        options.validate()?;

        let id = TransportId::next();

        Ok(async move {
            debug!(%id, %address, %scheme, port = address.port(), "Dialing backend");

            match Self::handshake(&address, &options).await {
                Ok(ws_stream) => Ok(Self::establish(id, address, handler, options, ws_stream)),
                Err(e) => {
                    warn!(%id, %address, error = %e, "Backend connect failed");
                    handler.on_error(&e);
                    Err(e)
                }
            }
        })
    }

    /// Performs TCP, TLS and WebSocket handshakes under the connect deadline.
    async fn handshake(address: &Address, options: &TransportOptions) -> Result<WsStream> {
        let connect = connect_async_with_config(
            address.as_str(),
            Some(options.websocket_config()),
            false,
        );

        let (ws_stream, _response) = timeout(options.connect_timeout, connect)
            .await
            .map_err(|_| Error::connection_timeout(options.connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("WebSocket handshake with {address} failed: {e}")))?;

        Ok(ws_stream)
    }

    /// Wraps an established stream and spawns its event loop.
    fn establish(
        id: TransportId,
        address: Address,
        handler: SharedHandler,
        options: TransportOptions,
        ws_stream: WsStream,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            id,
            address,
            handler,
            queue: OutboundQueue::new(),
            terminated: AtomicBool::new(false),
        });

        info!(%id, address = %shared.address, "Backend connection established");
        shared.handler.on_opened();

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&shared),
            options.write_timeout,
        ));

        Self { shared, commands }
    }

    /// Queues a message for transmission.
    ///
    /// Returns `true` once the message is queued. Delivery is not
    /// guaranteed: messages still queued when the transport terminates are
    /// dropped. Returns `false` if the transport has already terminated.
    pub fn send(&self, message: &Message) -> bool {
        match self.try_send(message) {
            Ok(()) => true,
            Err(Error::ConnectionClosed) => false,
            Err(e) => {
                warn!(id = %self.shared.id, error = %e, "Failed to encode outbound message");
                false
            }
        }
    }

    /// Queues a message, reporting why it was refused.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the transport has terminated
    /// - [`Error::Json`] if the message cannot be encoded
    pub fn try_send(&self, message: &Message) -> Result<()> {
        if self.shared.is_terminated() {
            return Err(Error::ConnectionClosed);
        }

        if self.shared.queue.enqueue(encode(message)?) {
            self.schedule(TransportCommand::Flush);
        }

        Ok(())
    }

    /// Schedules a keepalive ping.
    pub fn ping(&self) {
        self.schedule(TransportCommand::Ping);
    }

    /// Closes the connection gracefully.
    ///
    /// Sends a normal-closure frame. No handler callback fires for a
    /// local close.
    pub fn close(&self) {
        if self.shared.terminate() {
            debug!(id = %self.shared.id, "Closing backend connection");
            self.schedule(TransportCommand::Close);
        }
    }

    /// Returns `true` until a terminal event has occurred.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.shared.is_terminated()
    }

    /// Returns this transport's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TransportId {
        self.shared.id
    }

    /// Returns the address this transport connected to.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.shared.address
    }

    /// Returns the number of messages waiting for the next flush.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.queue.len()
    }

    fn schedule(&self, command: TransportCommand) {
        if self.commands.send(command).is_err() {
            trace!(id = %self.shared.id, "Event loop gone, command dropped");
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("id", &self.shared.id)
            .field("address", &self.shared.address.as_str())
            .field("connected", &self.is_connected())
            .field("pending", &self.pending_count())
            .finish()
    }
}

// ============================================================================
// Event Loop
// ============================================================================

impl Transport {
    /// Event loop that owns the socket.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        shared: Arc<Shared>,
        write_timeout: Duration,
    ) {
        let (mut ws_write, mut ws_read): (WsSink, WsSource) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the backend
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(frame)) => match Inbound::classify(frame) {
                            Ok(Inbound::Message(message)) => {
                                shared.handler.on_message(message);
                            }

                            Ok(Inbound::Closed { code, reason }) => {
                                shared.closed_by_peer(code, reason.as_deref());
                                let _ = timeout(write_timeout, ws_write.close()).await;
                                break;
                            }

                            Ok(Inbound::Ignored) => {}

                            Err(e) => {
                                shared.failed(e, &mut ws_write, write_timeout).await;
                                break;
                            }
                        },

                        Some(Err(e)) if is_peer_gone(&e) => {
                            shared.closed_by_peer(NO_STATUS_CODE, None);
                            break;
                        }

                        Some(Err(e)) => {
                            shared.failed(Error::WebSocket(e), &mut ws_write, write_timeout).await;
                            break;
                        }

                        None => {
                            shared.closed_by_peer(NO_STATUS_CODE, None);
                            break;
                        }
                    }
                }

                // Work scheduled by the transport handle
                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Flush) => {
                            if let Err(e) = Self::flush(&shared, &mut ws_write, write_timeout).await {
                                shared.failed(e, &mut ws_write, write_timeout).await;
                                break;
                            }
                        }

                        Some(TransportCommand::Ping) => {
                            trace!(id = %shared.id, "Sending ping");
                            let ping = ws_write.send(WsMessage::Ping(Default::default()));
                            let result = match timeout(write_timeout, ping).await {
                                Ok(result) => result.map_err(Error::from),
                                Err(_) => Err(Error::write_timeout(write_timeout.as_millis() as u64)),
                            };
                            if let Err(e) = result {
                                shared.failed(e, &mut ws_write, write_timeout).await;
                                break;
                            }
                        }

                        Some(TransportCommand::Close) | None => {
                            shared.terminate();
                            let _ = timeout(write_timeout, async {
                                let _ = ws_write.send(normal_close()).await;
                                let _ = ws_write.close().await;
                            })
                            .await;
                            break;
                        }
                    }
                }
            }
        }

        let dropped = shared.queue.discard();
        if dropped > 0 {
            debug!(id = %shared.id, dropped, "Discarded unsent messages");
        }

        debug!(id = %shared.id, "Event loop terminated");
    }

    /// Drains the outbound queue and writes it as one batch.
    async fn flush(shared: &Shared, ws_write: &mut WsSink, write_timeout: Duration) -> Result<()> {
        let batch = shared.queue.begin_flush();
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        let write = async {
            for text in batch {
                ws_write.feed(WsMessage::Text(text.into())).await?;
            }
            ws_write.flush().await
        };

        timeout(write_timeout, write)
            .await
            .map_err(|_| Error::write_timeout(write_timeout.as_millis() as u64))??;

        trace!(id = %shared.id, count, "Flushed outbound batch");
        Ok(())
    }
}

/// Returns `true` for errors meaning the peer vanished without a close frame.
fn is_peer_gone(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

// ============================================================================
// Tests
// ============================================================================
