//! Gateway integration tests.
//!
//! Drives a real `GatewayManager` over WebSockets against an in-process mock
//! gateway, covering handshake, heartbeats, routing, reconnect and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use kook_gateway::{
    ConnectionState, EventCategory, GatewayConfig, GatewayError, GatewayEvent, GatewayManager,
    MemorySink, StaticResolver, WsConnector,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Helpers - Mock Gateway Server
// ============================================================================

/// A mock gateway server for testing.
struct MockGateway {
    listener: TcpListener,
    addr: SocketAddr,
}

/// What the client sent during the WebSocket upgrade.
#[derive(Debug)]
struct Upgrade {
    uri: String,
    authorization: Option<String>,
}

impl MockGateway {
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        Self { listener, addr }
    }

    fn url(&self) -> String {
        format!("ws://{}/gateway?token=abc", self.addr)
    }

    async fn accept(&self) -> WebSocketStream<TcpStream> {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("no connection")
            .expect("accept");
        accept_async(stream).await.expect("handshake")
    }

    /// Accept one connection, recording the upgrade request.
    async fn accept_recording(&self) -> (WebSocketStream<TcpStream>, Upgrade) {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("no connection")
            .expect("accept");

        let (tx, rx) = oneshot::channel();
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let upgrade = Upgrade {
                uri: request.uri().to_string(),
                authorization: request
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            };
            let _ = tx.send(upgrade);
            Ok(response)
        };
        let ws = accept_hdr_async(stream, callback).await.expect("handshake");
        (ws, rx.await.expect("upgrade recorded"))
    }

    /// Accept one connection and complete the HELLO handshake.
    async fn accept_and_hello(&self, session_id: &str, interval_ms: u64) -> WebSocketStream<TcpStream> {
        let mut ws = self.accept().await;
        send(&mut ws, &hello(session_id, interval_ms)).await;
        ws
    }
}

fn hello(session_id: &str, interval_ms: u64) -> String {
    format!(r#"{{"s":1,"d":{{"session_id":"{session_id}","heartbeat_interval":{interval_ms}}}}}"#)
}

async fn send(ws: &mut WebSocketStream<TcpStream>, frame: &str) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("server send");
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    loop {
        match timeout(WAIT, ws.next()).await.expect("server read timed out") {
            Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => {}
        }
    }
}

// ============================================================================
// Test Helpers - Configuration
// ============================================================================

fn manager(gateway: &MockGateway, config: &GatewayConfig) -> (GatewayManager, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let manager = GatewayManager::with_parts(
        config,
        Arc::new(StaticResolver::new(gateway.url())),
        Arc::new(WsConnector::new(config.token.clone(), config.compress)),
        Arc::clone(&sink) as Arc<dyn kook_gateway::DebugSink>,
    );
    (manager, sink)
}

fn fast_config() -> GatewayConfig {
    GatewayConfig::new("secret").with_reconnect_interval(Duration::from_millis(50))
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<GatewayEvent>) -> GatewayEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("dispatcher dropped")
}

// ============================================================================
// Handshake Tests
// ============================================================================

#[tokio::test]
async fn test_connect_sends_bot_authorization() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config());

    let server = async {
        let (mut ws, upgrade) = gateway.accept_recording().await;
        send(&mut ws, &hello("s-1", 30_000)).await;
        (ws, upgrade)
    };
    let (result, (_ws, upgrade)) = tokio::join!(manager.connect(), server);

    result.expect("connect");
    assert_eq!(upgrade.authorization.as_deref(), Some("Bot secret"));
    assert_eq!(upgrade.uri, "/gateway?token=abc");
    assert_eq!(manager.state(), ConnectionState::Established);
    assert_eq!(manager.session().expect("session").session_id(), "s-1");
}

#[tokio::test]
async fn test_compress_flag_reaches_gateway_url() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config().with_compress(true));

    let server = async {
        let (mut ws, upgrade) = gateway.accept_recording().await;
        send(&mut ws, &hello("s-1", 30_000)).await;
        (ws, upgrade)
    };
    let (result, (_ws, upgrade)) = tokio::join!(manager.connect(), server);

    result.expect("connect");
    assert_eq!(upgrade.uri, "/gateway?token=abc&compress=1");
}

#[tokio::test]
async fn test_connect_fails_when_nothing_listens() {
    let gateway = MockGateway::new().await;
    let url = gateway.url();
    drop(gateway);

    let manager = GatewayManager::with_parts(
        &fast_config().with_auto_reconnect(false),
        Arc::new(StaticResolver::new(url)),
        Arc::new(WsConnector::new("secret", false)),
        Arc::new(MemorySink::new()),
    );

    let err = timeout(WAIT, manager.connect())
        .await
        .expect("connect timed out")
        .expect_err("nothing listens");
    assert!(matches!(err, GatewayError::Connection(_)));
    assert_eq!(manager.state(), ConnectionState::Failed);
}

// ============================================================================
// Heartbeat and Event Tests
// ============================================================================

#[tokio::test]
async fn test_heartbeat_ping_and_pong() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config());
    let mut pongs = manager.dispatcher().subscribe(EventCategory::Pong);

    let (result, mut ws) = tokio::join!(manager.connect(), gateway.accept_and_hello("s-1", 50));
    result.expect("connect");

    let ping = next_text(&mut ws).await.expect("ping");
    assert_eq!(ping, r#"{"s":2,"d":{}}"#);

    send(&mut ws, r#"{"s":3}"#).await;
    assert!(matches!(recv(&mut pongs).await, GatewayEvent::Pong));
}

#[tokio::test]
async fn test_events_are_routed_to_listeners() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config());
    let dispatcher = Arc::clone(manager.dispatcher());
    let mut messages = dispatcher.subscribe(EventCategory::Message);
    let mut reactions = dispatcher.subscribe(EventCategory::ReactionAdded);
    let mut system = dispatcher.subscribe(EventCategory::SystemEvent);

    let (result, mut ws) = tokio::join!(manager.connect(), gateway.accept_and_hello("s-1", 30_000));
    result.expect("connect");

    send(
        &mut ws,
        r#"{"s":0,"sn":1,"d":{"channel_type":"GROUP","type":9,"target_id":"c1","author_id":"u1","content":"**hi**","msg_id":"m1","msg_timestamp":1700000000000,"nonce":"","extra":{"type":9}}}"#,
    )
    .await;
    send(
        &mut ws,
        r#"{"s":0,"sn":2,"d":{"channel_type":"GROUP","type":255,"target_id":"c1","extra":{"type":"added_reaction","body":{"msg_id":"m1","user_id":"u2","channel_id":"c1","emoji":{"id":"e1","name":"thumbs"}}}}}"#,
    )
    .await;

    match recv(&mut messages).await {
        GatewayEvent::Event(event) => {
            assert_eq!(event.content, "**hi**");
            assert_eq!(event.author_id, "u1");
        }
        other => panic!("unexpected: {other:?}"),
    }

    let reaction = recv(&mut reactions).await;
    let body: kook_gateway::kook_proto::bodies::ReactionBody = reaction
        .envelope()
        .expect("system payload")
        .body_as()
        .expect("reaction body");
    assert_eq!(body.user_id, "u2");
    assert!(matches!(recv(&mut system).await, GatewayEvent::System { .. }));

    assert_eq!(manager.session().expect("session").last_sequence(), 2);
}

// ============================================================================
// Reconnect and Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config());
    let mut ready = manager.dispatcher().subscribe(EventCategory::Ready);

    let (result, mut ws) = tokio::join!(manager.connect(), gateway.accept_and_hello("first", 30_000));
    result.expect("connect");
    assert!(matches!(recv(&mut ready).await, GatewayEvent::Ready { .. }));

    ws.close(None).await.expect("close");
    drop(ws);

    let _ws = gateway.accept_and_hello("second", 30_000).await;
    match recv(&mut ready).await {
        GatewayEvent::Ready { session_id } => assert_eq!(session_id, "second"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(manager.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_reconnect_signal_forces_new_connection() {
    let gateway = MockGateway::new().await;
    let (manager, sink) = manager(&gateway, &fast_config());
    let mut ready = manager.dispatcher().subscribe(EventCategory::Ready);

    let (result, mut ws) = tokio::join!(manager.connect(), gateway.accept_and_hello("first", 30_000));
    result.expect("connect");
    recv(&mut ready).await;

    send(&mut ws, r#"{"s":4,"d":{"code":41008,"err":"missing params"}}"#).await;
    assert!(next_text(&mut ws).await.is_none(), "client should close");

    let _ws = gateway.accept_and_hello("second", 30_000).await;
    recv(&mut ready).await;
    assert!(sink.contains_debug("server requested reconnect"));
}

#[tokio::test]
async fn test_disconnect_closes_socket_and_stays_down() {
    let gateway = MockGateway::new().await;
    let (manager, _sink) = manager(&gateway, &fast_config());
    let mut stopped = manager.dispatcher().subscribe(EventCategory::Stopped);

    let (result, mut ws) = tokio::join!(manager.connect(), gateway.accept_and_hello("s-1", 30_000));
    result.expect("connect");

    manager.disconnect().await;
    assert!(matches!(recv(&mut stopped).await, GatewayEvent::Stopped));
    assert_eq!(manager.state(), ConnectionState::Idle);
    assert!(next_text(&mut ws).await.is_none());

    let reconnect = timeout(Duration::from_millis(300), gateway.listener.accept()).await;
    assert!(reconnect.is_err(), "manager reconnected after disconnect");
}
