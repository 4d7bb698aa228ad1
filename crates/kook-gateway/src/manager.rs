//! Gateway session manager.
//!
//! One driver task owns every piece of mutable connection state: the cached
//! endpoint, the transport, the heartbeat timer, the reconnect timer and the
//! attempt counter. [`GatewayManager`] talks to it over a command channel and
//! reads a few shared snapshots (state, session, attempts) without locking the
//! driver.
//!
//! ```text
//! Idle ──connect──▶ ResolvingEndpoint ──▶ Connecting ──▶ AwaitingHandshake ──HELLO──▶ Established
//!                                            ▲                                          │
//!                                            └──── Reconnecting ◀── close / RECONNECT ──┘
//!                                                        │
//!                                                        └── budget spent ──▶ Failed
//! ```

use std::fmt;
use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use kook_proto::{ProtoError, Signal, SignalType};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

use crate::config::GatewayConfig;
use crate::dispatcher::EventDispatcher;
use crate::error::GatewayError;
use crate::events::GatewayEvent;
use crate::heartbeat::HeartbeatScheduler;
use crate::reconnect::{ReconnectConfig, ReconnectDecision};
use crate::resolver::{EndpointResolver, HttpEndpointResolver};
use crate::router::{self, EventCategory};
use crate::session::Session;
use crate::sink::{DebugSink, TracingSink};
use crate::state::{AtomicConnectionState, ConnectionState};
use crate::transport::{Connection, Connector, TransportEvent, WsConnector};

type Pending<T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send>>;
type Waiter = oneshot::Sender<Result<(), GatewayError>>;

enum Command {
    Connect(Waiter),
    Disconnect(oneshot::Sender<()>),
}

/// State readable from outside the driver.
#[derive(Debug)]
struct Shared {
    state: AtomicConnectionState,
    session: RwLock<Option<Session>>,
    attempts: AtomicU32,
}

/// Maintains one authenticated gateway connection and routes its events.
///
/// The driver task is spawned on the first [`connect`](Self::connect) or
/// [`disconnect`](Self::disconnect) and lives as long as the manager, so the
/// resolved endpoint is reused for every reconnect.
pub struct GatewayManager {
    reconnect: ReconnectConfig,
    compress: bool,
    resolver: Arc<dyn EndpointResolver>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn DebugSink>,
    dispatcher: Arc<EventDispatcher>,
    shared: Arc<Shared>,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl GatewayManager {
    /// Create a manager that resolves over HTTP and connects with WebSockets.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(HttpEndpointResolver::from_config(config)),
            Arc::new(WsConnector::new(config.token.clone(), config.compress)),
            Arc::new(TracingSink),
        )
    }

    /// Create a manager from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: &GatewayConfig,
        resolver: Arc<dyn EndpointResolver>,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        Self {
            reconnect: config.reconnect_config(),
            compress: config.compress,
            resolver,
            connector,
            sink,
            dispatcher: Arc::new(EventDispatcher::new()),
            shared: Arc::new(Shared {
                state: AtomicConnectionState::new(ConnectionState::Idle),
                session: RwLock::new(None),
                attempts: AtomicU32::new(0),
            }),
            commands: Mutex::new(None),
        }
    }

    /// Replace the debug sink. Has no effect once the driver is running.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Listener registry for this manager.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.load()
    }

    /// Snapshot of the current session, if a handshake has completed.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.shared.session.read().clone()
    }

    /// Whether the session is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Established
    }

    /// Consecutive reconnect attempts since the last successful handshake.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Connect and wait for the handshake.
    ///
    /// Resolves once the session is established. Returns immediately if it
    /// already is; joins the in-flight attempt if one is running.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint lookup fails, the transport fails before the
    /// handshake, or [`disconnect`](Self::disconnect) cancels the attempt.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        let (reply, rx) = oneshot::channel();
        self.driver()
            .send(Command::Connect(reply))
            .map_err(|_| GatewayError::Shutdown)?;
        rx.await.map_err(|_| GatewayError::Shutdown)?
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Works from any state and always ends in [`ConnectionState::Idle`]
    /// followed by a `stopped` notification.
    pub async fn disconnect(&self) {
        let (reply, rx) = oneshot::channel();
        if self.driver().send(Command::Disconnect(reply)).is_ok() {
            let _ = rx.await;
        }
    }

    fn driver(&self) -> mpsc::UnboundedSender<Command> {
        let mut slot = self.commands.lock();
        if let Some(tx) = slot.as_ref().filter(|tx| !tx.is_closed()) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Driver {
            reconnect: self.reconnect,
            compress: self.compress,
            resolver: Arc::clone(&self.resolver),
            connector: Arc::clone(&self.connector),
            sink: Arc::clone(&self.sink),
            dispatcher: Arc::clone(&self.dispatcher),
            shared: Arc::clone(&self.shared),
            endpoint: None,
            resolving: None,
            dialing: None,
            connection: None,
            heartbeat: HeartbeatScheduler::new(),
            retry_at: None,
            attempts: 0,
            manual_close: false,
            waiters: Vec::new(),
        };
        tokio::spawn(driver.run(rx));
        *slot = Some(tx.clone());
        tx
    }
}

impl fmt::Debug for GatewayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayManager")
            .field("state", &self.state())
            .field("reconnect", &self.reconnect)
            .field("compress", &self.compress)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Returns the shared snapshot to `Idle` when the driver ends, including
/// when a listener panics inside it.
struct ResetOnExit(Arc<Shared>);

impl Drop for ResetOnExit {
    fn drop(&mut self) {
        self.0.state.swap(ConnectionState::Idle);
        *self.0.session.write() = None;
        self.0.attempts.store(0, Ordering::SeqCst);
    }
}

struct Driver {
    reconnect: ReconnectConfig,
    compress: bool,
    resolver: Arc<dyn EndpointResolver>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn DebugSink>,
    dispatcher: Arc<EventDispatcher>,
    shared: Arc<Shared>,
    endpoint: Option<String>,
    resolving: Option<Pending<String>>,
    dialing: Option<Pending<Connection>>,
    connection: Option<Connection>,
    heartbeat: HeartbeatScheduler,
    retry_at: Option<Instant>,
    attempts: u32,
    manual_close: bool,
    waiters: Vec<Waiter>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let _reset = ResetOnExit(Arc::clone(&self.shared));
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Connect(reply)) => self.on_connect(reply),
                    Some(Command::Disconnect(reply)) => {
                        self.on_disconnect();
                        let _ = reply.send(());
                    }
                    None => break,
                },
                result = poll_slot(&mut self.resolving) => {
                    self.resolving = None;
                    self.on_resolved(result);
                }
                result = poll_slot(&mut self.dialing) => {
                    self.dialing = None;
                    self.on_dialed(result);
                }
                event = next_event(&mut self.connection) => self.on_transport(event),
                () = sleep_until_some(self.retry_at) => {
                    self.retry_at = None;
                    self.dial();
                }
            }
        }

        self.drop_connection();
        self.reject_waiters(&GatewayError::Shutdown);
        self.set_state(ConnectionState::Idle);
        tracing::debug!("gateway driver stopped");
    }

    fn on_connect(&mut self, reply: Waiter) {
        let state = self.shared.state.load();
        if state == ConnectionState::Established {
            let _ = reply.send(Ok(()));
            return;
        }

        self.waiters.push(reply);
        if state.is_connecting() {
            return;
        }

        self.manual_close = false;
        self.set_attempts(0);
        if self.endpoint.is_some() {
            self.dial();
        } else {
            self.resolve();
        }
    }

    fn resolve(&mut self) {
        self.set_state(ConnectionState::ResolvingEndpoint);
        self.debug("resolving gateway endpoint");

        let resolver = Arc::clone(&self.resolver);
        let compress = self.compress;
        self.resolving = Some(Box::pin(async move { resolver.resolve(compress).await }));
    }

    fn on_resolved(&mut self, result: Result<String, GatewayError>) {
        match result {
            Ok(url) => {
                self.debug("gateway endpoint resolved");
                self.endpoint = Some(url);
                self.dial();
            }
            Err(err) => {
                self.report(err.clone());
                self.reject_waiters(&err);
                self.set_state(ConnectionState::Idle);
            }
        }
    }

    fn dial(&mut self) {
        let Some(url) = self.endpoint.clone() else {
            self.resolve();
            return;
        };

        self.set_state(ConnectionState::Connecting);
        if self.attempts > 0 {
            self.debug(format!(
                "reconnect attempt {}/{}",
                self.attempts, self.reconnect.max_attempts
            ));
        }

        let connector = Arc::clone(&self.connector);
        self.dialing = Some(Box::pin(async move { connector.connect(&url).await }));
    }

    fn on_dialed(&mut self, result: Result<Connection, GatewayError>) {
        match result {
            Ok(connection) => {
                self.connection = Some(connection);
                self.set_state(ConnectionState::AwaitingHandshake);
                self.debug("transport open, awaiting HELLO");
            }
            Err(err) => {
                self.report(err.clone());
                self.reject_waiters(&err);
                self.schedule_retry(&err.to_string());
            }
        }
    }

    fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(text) => self.on_frame(Signal::decode(&text)),
            TransportEvent::Binary(bytes) => self.on_frame(Signal::decode_bytes(&bytes)),
            TransportEvent::Closed { reason } => self.on_closed(&reason),
        }
    }

    fn on_frame(&mut self, decoded: Result<Signal, ProtoError>) {
        let signal = match decoded {
            Ok(signal) => signal,
            Err(err) => {
                self.report(err.into());
                return;
            }
        };

        match signal.signal_type {
            SignalType::Hello => self.on_hello(&signal),
            SignalType::Event => self.on_event(&signal),
            SignalType::Pong => {
                tracing::trace!("heartbeat acknowledged");
                self.dispatcher.emit(EventCategory::Pong, &GatewayEvent::Pong);
            }
            SignalType::Reconnect => {
                self.debug("server requested reconnect");
                self.drop_connection();
                self.schedule_retry("server requested reconnect");
            }
            other @ (SignalType::Ping | SignalType::Resume | SignalType::Unknown(_)) => {
                self.debug(format!("ignoring {other} signal"));
            }
        }
    }

    fn on_hello(&mut self, signal: &Signal) {
        let hello = match signal.hello_data() {
            Ok(hello) => hello,
            Err(err) => {
                self.report(err.into());
                return;
            }
        };
        let ping = match Signal::ping().encode() {
            Ok(frame) => frame,
            Err(err) => {
                self.report(err.into());
                return;
            }
        };
        let Some(connection) = self.connection.as_ref() else {
            return;
        };

        let session = Session::from_hello(&hello);
        let sender = connection.sender();
        let open = connection.open_flag();
        self.heartbeat.start(
            session.heartbeat_interval(),
            move || open.load(Ordering::SeqCst),
            move || {
                if let Err(e) = sender.try_send(ping.clone()) {
                    tracing::debug!(error = %e, "failed to queue heartbeat");
                }
            },
        );
        *self.shared.session.write() = Some(session);
        self.set_attempts(0);

        let previous = self.set_state(ConnectionState::Established);
        self.debug(format!("session {} established", hello.session_id));
        if previous != ConnectionState::Established {
            self.dispatcher.emit(
                EventCategory::Ready,
                &GatewayEvent::Ready {
                    session_id: hello.session_id,
                },
            );
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(Ok(()));
            }
        }
    }

    fn on_event(&mut self, signal: &Signal) {
        if let Some(sn) = signal.sn {
            if let Some(session) = self.shared.session.write().as_mut() {
                session.observe_sequence(sn);
            }
        }

        let event = match signal.event_data() {
            Ok(event) => Arc::new(event),
            Err(err) => {
                self.report(err.into());
                return;
            }
        };
        self.dispatcher
            .emit(EventCategory::Raw, &GatewayEvent::Event(Arc::clone(&event)));

        let routed = router::route(&event);
        if routed.categories.is_empty() {
            self.debug(format!("no category for event type {}", event.type_code));
            return;
        }

        let envelope = match routed.envelope {
            Some(Ok(envelope)) => {
                if !envelope.kind.is_recognized() {
                    self.debug(format!("unmapped system event {}", envelope.kind));
                }
                Some(Arc::new(envelope))
            }
            Some(Err(err)) => {
                self.debug(format!("malformed system event: {err}"));
                None
            }
            None => None,
        };
        let payload = match envelope {
            Some(envelope) => GatewayEvent::System { event, envelope },
            None => GatewayEvent::Event(event),
        };

        for category in routed.categories {
            self.dispatcher.emit(category, &payload);
        }
    }

    fn on_closed(&mut self, reason: &str) {
        self.drop_connection();
        self.debug(format!("gateway connection closed: {reason}"));

        let cause = format!("connection closed: {reason}");
        self.reject_waiters(&GatewayError::Connection(cause.clone()));
        self.schedule_retry(&cause);
    }

    fn on_disconnect(&mut self) {
        self.manual_close = true;
        self.retry_at = None;
        self.resolving = None;
        self.dialing = None;
        if self.connection.is_some() {
            self.set_state(ConnectionState::Closing);
        }
        self.drop_connection();
        self.reject_waiters(&GatewayError::Cancelled);
        self.set_state(ConnectionState::Idle);

        self.debug("gateway disconnected");
        self.dispatcher
            .emit(EventCategory::Stopped, &GatewayEvent::Stopped);
    }

    /// Consult the reconnect policy after a drop. Giving up surfaces exactly
    /// one fatal error, carrying `cause` when reconnect is turned off.
    fn schedule_retry(&mut self, cause: &str) {
        match self.reconnect.decide(self.attempts, self.manual_close) {
            ReconnectDecision::Retry { attempt, delay } => {
                self.set_attempts(attempt);
                self.set_state(ConnectionState::Reconnecting);
                self.retry_at = Some(Instant::now() + delay);
                self.debug(format!("reconnecting in {} ms", delay.as_millis()));
            }
            ReconnectDecision::Exhausted { attempts } => {
                self.give_up(GatewayError::ReconnectExhausted { attempts });
            }
            ReconnectDecision::Disabled => {
                self.give_up(GatewayError::ReconnectDisabled {
                    reason: cause.to_string(),
                });
            }
            ReconnectDecision::Suppressed => {
                self.set_state(ConnectionState::Idle);
            }
        }
    }

    fn give_up(&mut self, err: GatewayError) {
        self.report(err.clone());
        self.reject_waiters(&err);
        self.set_state(ConnectionState::Failed);
    }

    fn drop_connection(&mut self) {
        self.heartbeat.stop();
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        *self.shared.session.write() = None;
    }

    fn reject_waiters(&mut self, err: &GatewayError) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(err.clone()));
        }
    }

    fn set_state(&self, state: ConnectionState) -> ConnectionState {
        let previous = self.shared.state.swap(state);
        if previous != state {
            tracing::trace!(from = %previous, to = %state, "gateway state changed");
        }
        previous
    }

    fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
        self.shared.attempts.store(attempts, Ordering::SeqCst);
    }

    fn debug(&self, message: impl Into<String>) {
        let message = message.into();
        self.sink.debug(&message);
        self.dispatcher
            .emit(EventCategory::Debug, &GatewayEvent::Debug(message));
    }

    fn report(&self, err: GatewayError) {
        self.sink.error(&err);
        self.dispatcher
            .emit(EventCategory::Error, &GatewayEvent::Error(err));
    }
}

async fn poll_slot<T>(slot: &mut Option<Pending<T>>) -> Result<T, GatewayError> {
    match slot {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_event(connection: &mut Option<Connection>) -> TransportEvent {
    match connection {
        Some(connection) => connection
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed {
                reason: "transport dropped".to_string(),
            }),
        None => pending().await,
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
