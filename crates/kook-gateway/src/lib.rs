//! # kook-gateway
//!
//! Session manager for the KOOK bot gateway.
//!
//! [`GatewayManager`] resolves the gateway endpoint once, opens a WebSocket,
//! waits for HELLO, keeps the session alive with heartbeats and reconnects a
//! bounded number of times at a fixed delay. Decoded events are routed into
//! named [`EventCategory`] channels on an [`EventDispatcher`].
//!
//! ```no_run
//! use kook_gateway::{EventCategory, GatewayConfig, GatewayEvent, GatewayManager};
//!
//! # async fn run() -> Result<(), kook_gateway::GatewayError> {
//! let manager = GatewayManager::new(&GatewayConfig::new("bot-token"));
//! manager.dispatcher().on(EventCategory::Message, |event: &GatewayEvent| {
//!     if let Some(event) = event.event() {
//!         println!("{}: {}", event.author_id, event.content);
//!     }
//! });
//! manager.connect().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod manager;
pub mod reconnect;
pub mod resolver;
pub mod router;
pub mod session;
pub mod sink;
pub mod state;
pub mod transport;

pub use config::{DEFAULT_API_BASE, GatewayConfig};
pub use dispatcher::EventDispatcher;
pub use error::GatewayError;
pub use events::GatewayEvent;
pub use heartbeat::HeartbeatScheduler;
pub use manager::GatewayManager;
pub use reconnect::{ReconnectConfig, ReconnectDecision};
pub use resolver::{EndpointResolver, HttpEndpointResolver, StaticResolver};
pub use router::{EventCategory, RoutedEvent, route};
pub use session::{DEFAULT_HEARTBEAT_INTERVAL, Session};
pub use sink::{DebugSink, MemorySink, SinkLine, TracingSink};
pub use state::{AtomicConnectionState, ConnectionState};
pub use transport::{Connection, ConnectionPeer, Connector, TransportEvent, WsConnector};

pub use kook_proto;
