//! Transport seam between the session manager and the WebSocket.
//!
//! A [`Connection`] is a pair of channels plus an open flag. The manager never
//! touches the socket directly, which lets tests drive it with a
//! [`ConnectionPeer`] instead of a real server.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::GatewayError;

/// Capacity of the per-connection frame channels.
const CHANNEL_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something the transport reports to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame.
    Frame(String),
    /// A binary frame.
    Binary(Vec<u8>),
    /// The transport closed; no further events follow.
    Closed {
        /// Human-readable close reason.
        reason: String,
    },
}

/// Manager-side handle of an open transport.
#[derive(Debug)]
pub struct Connection {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<TransportEvent>,
    open: Arc<AtomicBool>,
    shutdown: Option<oneshot::Sender<()>>,
}

/// Remote side of a [`Connection`], held by the transport implementation.
#[derive(Debug)]
pub struct ConnectionPeer {
    /// Frames written by the manager.
    pub outbound: mpsc::Receiver<String>,
    /// Events delivered to the manager.
    pub inbound: mpsc::Sender<TransportEvent>,
    /// Shared open flag.
    pub open: Arc<AtomicBool>,
    /// Fires when the manager closes or drops its end.
    pub shutdown: oneshot::Receiver<()>,
}

impl Connection {
    /// Create a connected pair. The flag starts open.
    #[must_use]
    pub fn pair() -> (Self, ConnectionPeer) {
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let open = Arc::new(AtomicBool::new(true));

        let connection = Self {
            outbound: out_tx,
            inbound: in_rx,
            open: Arc::clone(&open),
            shutdown: Some(shutdown_tx),
        };
        let peer = ConnectionPeer {
            outbound: out_rx,
            inbound: in_tx,
            open,
            shutdown: shutdown_rx,
        };
        (connection, peer)
    }

    /// Whether the transport reports itself open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Shared open flag, for tasks that outlive a borrow of the connection.
    #[must_use]
    pub fn open_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.open)
    }

    /// Clone of the outbound frame sender.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<String> {
        self.outbound.clone()
    }

    /// Queue a frame for sending.
    ///
    /// # Errors
    ///
    /// Fails if the transport is closed or its queue is full.
    pub fn send(&self, frame: String) -> Result<(), GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::Connection("transport is not open".to_string()));
        }
        self.outbound
            .try_send(frame)
            .map_err(|e| GatewayError::Connection(format!("failed to queue frame: {e}")))
    }

    /// Next transport event. `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    /// Close the transport. Idempotent.
    pub fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Boxed future returned by [`Connector::connect`].
pub type ConnectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Connection, GatewayError>> + Send + 'a>>;

/// Opens transports to a gateway URL.
pub trait Connector: Send + Sync {
    /// Open a transport to `url`. Resolves once the transport is open.
    fn connect<'a>(&'a self, url: &'a str) -> ConnectFuture<'a>;
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsConnector {
    token: String,
    compress: bool,
}

impl WsConnector {
    /// Create a connector authenticating with a bot `token`.
    #[must_use]
    pub fn new(token: impl Into<String>, compress: bool) -> Self {
        Self {
            token: token.into(),
            compress,
        }
    }

    /// The URL actually dialled for `url`.
    ///
    /// # Errors
    ///
    /// Fails if `url` does not parse.
    pub fn connect_url(&self, url: &str) -> Result<Url, GatewayError> {
        let mut parsed =
            Url::parse(url).map_err(|e| GatewayError::Connection(format!("invalid url: {e}")))?;
        if self.compress && !parsed.query_pairs().any(|(key, _)| key == "compress") {
            parsed.query_pairs_mut().append_pair("compress", "1");
        }
        Ok(parsed)
    }

    async fn open(&self, url: &str) -> Result<Connection, GatewayError> {
        let target = self.connect_url(url)?;

        let mut request = target
            .as_str()
            .into_client_request()
            .map_err(|e| GatewayError::Connection(format!("invalid request: {e}")))?;
        let auth = HeaderValue::from_str(&format!("Bot {}", self.token))
            .map_err(|e| GatewayError::Connection(format!("invalid token: {e}")))?;
        request.headers_mut().insert("Authorization", auth);

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GatewayError::Connection(format!("failed to connect: {e}")))?;

        let (write, read) = ws_stream.split();
        let (connection, peer) = Connection::pair();
        let ConnectionPeer {
            outbound,
            inbound,
            open,
            shutdown,
        } = peer;

        tokio::spawn(reader_task(read, inbound, Arc::clone(&open)));
        tokio::spawn(writer_task(write, outbound, shutdown, open));

        Ok(connection)
    }
}

impl Connector for WsConnector {
    fn connect<'a>(&'a self, url: &'a str) -> ConnectFuture<'a> {
        Box::pin(self.open(url))
    }
}

async fn reader_task(
    mut read: SplitStream<WsStream>,
    tx: mpsc::Sender<TransportEvent>,
    open: Arc<AtomicBool>,
) {
    let reason = loop {
        let event = match read.next().await {
            Some(Ok(Message::Text(text))) => TransportEvent::Frame(text.as_str().to_owned()),
            Some(Ok(Message::Binary(data))) => TransportEvent::Binary(data.to_vec()),
            Some(Ok(Message::Close(frame))) => {
                break frame.map_or_else(
                    || "closed by server".to_string(),
                    |f| format!("closed by server ({}): {}", u16::from(f.code), f.reason.as_str()),
                );
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => break e.to_string(),
            None => break "connection closed".to_string(),
        };
        if tx.send(event).await.is_err() {
            break "receiver dropped".to_string();
        }
    };

    open.store(false, Ordering::SeqCst);
    tracing::debug!(%reason, "gateway transport closed");
    let _ = tx.send(TransportEvent::Closed { reason }).await;
}

async fn writer_task(
    mut write: SplitSink<WsStream, Message>,
    mut rx: mpsc::Receiver<String>,
    mut shutdown: oneshot::Receiver<()>,
    open: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            frame = rx.recv() => match frame {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        tracing::debug!(error = %e, "gateway write failed");
                        break;
                    }
                }
                None => break,
            },
        }
    }

    open.store(false, Ordering::SeqCst);
    let _ = write.send(Message::Close(None)).await;
    let _ = write.close().await;
}
