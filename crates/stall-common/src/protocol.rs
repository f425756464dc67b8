//! Wire protocol shared by the kiosk and the cashier.
//!
//! Every message is a JSON object in a text frame:
//!
//! ```text
//! customer → broker   {"Nome": "Ana", "Produtos": [{"flavor": "Jerry", "ingredients": "Bacon, Calabresa"}], "Total": "12.00"}
//! cashier  → broker   {"Nome": "Ana", "Produtos": [...], "forwardedToCozinha": true}
//! ```
//!
//! The broker echoes every frame to every peer, so a cashier sees its own
//! forwards come back. `forwardedToCozinha` is what lets it ignore them.

use std::str::Utf8Error;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{LineItem, Money, Order};

/// Separator used to join ingredient names on the wire.
pub const INGREDIENT_SEPARATOR: &str = ", ";

/// Errors decoding or encoding a wire message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("binary frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid total: {0}")]
    InvalidTotal(String),

    #[error("order has no customer name")]
    MissingName,

    #[error("order has no products")]
    NoItems,
}

/// A websocket data frame as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Product entry as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct WireProduct {
    flavor: String,
    #[serde(default)]
    ingredients: String,
}

/// `Total` is written as a string; numbers are accepted on input.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireTotal {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireOrder {
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Produtos")]
    products: Vec<WireProduct>,
    #[serde(rename = "Total", default, skip_serializing_if = "Option::is_none")]
    total: Option<WireTotal>,
    #[serde(rename = "forwardedToCozinha", default, skip_serializing_if = "is_false")]
    forwarded: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn split_ingredients(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&Order> for WireOrder {
    fn from(order: &Order) -> Self {
        Self {
            name: order.customer_name.clone(),
            products: order
                .items
                .iter()
                .map(|item| WireProduct {
                    flavor: item.flavor.clone(),
                    ingredients: item.ingredients.join(INGREDIENT_SEPARATOR),
                })
                .collect(),
            total: order.total.map(|t| WireTotal::Text(t.to_string())),
            forwarded: order.forwarded,
            extra: order.extra.clone(),
        }
    }
}

impl TryFrom<WireOrder> for Order {
    type Error = ProtocolError;

    fn try_from(wire: WireOrder) -> Result<Self, Self::Error> {
        if wire.name.trim().is_empty() {
            return Err(ProtocolError::MissingName);
        }
        if wire.products.is_empty() {
            return Err(ProtocolError::NoItems);
        }

        let total = match wire.total {
            None => None,
            Some(WireTotal::Text(text)) => {
                Some(Money::parse(&text).ok_or(ProtocolError::InvalidTotal(text))?)
            }
            Some(WireTotal::Number(n)) => {
                let text = n.to_string();
                Some(Money::parse(&text).ok_or(ProtocolError::InvalidTotal(text))?)
            }
        };

        Ok(Order {
            customer_name: wire.name,
            items: wire
                .products
                .into_iter()
                .map(|p| LineItem::new(p.flavor, split_ingredients(&p.ingredients)))
                .collect(),
            total,
            forwarded: wire.forwarded,
            extra: wire.extra,
        })
    }
}

/// Encode an order as a JSON text payload.
pub fn encode(order: &Order) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&WireOrder::from(order))?)
}

/// Decode a text payload into an order.
pub fn decode_text(text: &str) -> Result<Order, ProtocolError> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return Err(ProtocolError::NotAnObject);
    }

    let wire: WireOrder = serde_json::from_str(trimmed)?;
    Order::try_from(wire)
}

/// Decode a frame, interpreting binary payloads as UTF-8 text first.
pub fn decode_frame(frame: &Frame) -> Result<Order, ProtocolError> {
    match frame {
        Frame::Text(text) => decode_text(text),
        Frame::Binary(bytes) => decode_text(std::str::from_utf8(bytes)?),
    }
}
