//! Shared types and wire protocol for the stall order relay.
//!
//! This crate contains:
//! - Money and order types (Money, LineItem, Order)
//! - The menu and its pricing rules
//! - The JSON wire protocol spoken by kiosk and cashier

pub mod menu;
pub mod pricing;
pub mod protocol;
pub mod types;

pub use menu::{Category, Menu, MenuError, MenuSpec, COMBO_COMPONENTS};
pub use pricing::{compute_total, line_total};
pub use protocol::{decode_frame, decode_text, encode, Frame, ProtocolError};
pub use types::*;
