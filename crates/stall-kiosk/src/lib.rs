//! Stall-kiosk: the customer-facing order composer.
//!
//! This crate provides:
//! - The order composer (selection, cart, validation, submit)
//! - Kiosk configuration (TOML + CLI overrides)
//! - The console command parser used by the binary

pub mod composer;
pub mod config;
pub mod console;

pub use composer::{CartEntry, CartEntryId, Composer, ComposerError, PendingOrder};
pub use config::KioskConfig;
