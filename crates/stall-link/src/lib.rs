//! Websocket link for the stall clients.
//!
//! Provides the connection manager both the kiosk and the cashier use to
//! reach the broker:
//! - Session lifecycle and reconnection prompt state
//! - Stale-session filtering so only one connection is ever live
//! - The `OrderSink` seam through which orders are transmitted

pub mod connection;

pub use connection::{
    ConnectionManager, ConnectionState, Effect, LinkConfig, LinkError, LinkEvent, OrderSink,
    SessionEvent, CONNECT_FAILED_NOTICE, DEFAULT_PORT,
};
