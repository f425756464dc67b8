//! Stall-cashier: relay client between customers and the kitchen.
//!
//! Receives customer orders from the broker, queues them, and lets the
//! cashier forward each one to the kitchen or cancel it.

pub mod config;
pub mod console;
pub mod relay;

pub use config::CashierConfig;
pub use relay::{Intake, OrderId, QueueView, QueuedOrder, RelayError, RelayQueue};
