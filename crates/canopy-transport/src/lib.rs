//! Transport for captured forests and UI events.
//!
//! One long-lived bidirectional channel streams client frames up and serves
//! controller pull-requests; two deprecated unary calls remain for old
//! controllers. Both transports sit behind the single [`ForestSink`]
//! capability so capture logic exists exactly once.

pub mod channel;
pub mod link;
pub mod sink;
pub mod unary;
pub mod wire;

pub use channel::{BidiChannel, Connector, TransportError, WsConnector};
pub use link::{Link, LinkDriver, LinkHandle, LinkState, NoReconnect, ReconnectPolicy};
pub use sink::ForestSink;
pub use unary::UnaryClient;
pub use wire::{ClientToServer, ServerToClient};
