//! Order composer - the customer-side pending order.
//!
//! Accumulates a flavor selection into cart lines, validates them and, on
//! submit, prices the cart, transmits it and starts over:
//!
//! ```text
//! select_flavor → toggle_ingredient* → confirm_selection → ... → submit
//! ```

use stall_common::{compute_total, encode, LineItem, Menu, Money, Order, ProtocolError, COMBO_COMPONENTS};
use stall_link::{LinkError, OrderSink};
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned to the presentation layer.
#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("no flavor selected")]
    NoFlavorSelected,

    #[error("{flavor} needs exactly {expected} flavors, {got} selected")]
    InvalidSelection {
        flavor: String,
        expected: usize,
        got: usize,
    },

    #[error("{ingredient} is not an option for {flavor}")]
    UnknownIngredient { flavor: String, ingredient: String },

    #[error("customer name is empty")]
    EmptyName,

    #[error("cart is empty")]
    EmptyCart,

    #[error("failed to encode order: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("failed to send order: {0}")]
    Link(#[from] LinkError),
}

/// Identity of one cart line, stable for the line's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartEntryId(u64);

/// A cart line.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub id: CartEntryId,
    pub item: LineItem,
}

/// Working state of the order being composed.
#[derive(Debug, Clone, Default)]
pub struct PendingOrder {
    selected_flavor: Option<String>,
    /// Unique, in selection order.
    selected_ingredients: Vec<String>,
    cart: Vec<CartEntry>,
}

/// Builds and submits customer orders.
pub struct Composer {
    menu: Menu,
    pending: PendingOrder,
    next_entry: u64,
}

impl Composer {
    pub fn new(menu: Menu) -> Self {
        Self {
            menu,
            pending: PendingOrder::default(),
            next_entry: 1,
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn pending(&self) -> &PendingOrder {
        &self.pending
    }

    pub fn selected_flavor(&self) -> Option<&str> {
        self.pending.selected_flavor.as_deref()
    }

    pub fn selected_ingredients(&self) -> &[String] {
        &self.pending.selected_ingredients
    }

    pub fn cart(&self) -> &[CartEntry] {
        &self.pending.cart
    }

    /// Select a flavor, resetting the ingredient selection.
    ///
    /// Returns the flavor's description for display.
    pub fn select_flavor(&mut self, flavor: &str) -> Option<&str> {
        debug!("Selected flavor {flavor}");
        self.pending.selected_flavor = Some(flavor.to_string());
        self.pending.selected_ingredients.clear();
        self.menu.description(flavor)
    }

    /// Choices available for the current selection.
    pub fn ingredient_options(&self) -> Vec<&str> {
        match &self.pending.selected_flavor {
            Some(flavor) => self.menu.options_for(flavor),
            None => Vec::new(),
        }
    }

    /// Toggle an ingredient; returns whether it is now selected.
    ///
    /// Only ids from [`Composer::ingredient_options`] are accepted. On error
    /// the selection is left as it was.
    pub fn toggle_ingredient(&mut self, id: &str) -> Result<bool, ComposerError> {
        let flavor = self
            .pending
            .selected_flavor
            .as_deref()
            .ok_or(ComposerError::NoFlavorSelected)?;
        if !self.menu.options_for(flavor).contains(&id) {
            return Err(ComposerError::UnknownIngredient {
                flavor: flavor.to_string(),
                ingredient: id.to_string(),
            });
        }

        let selected = &mut self.pending.selected_ingredients;
        match selected.iter().position(|s| s == id) {
            Some(pos) => {
                selected.remove(pos);
                Ok(false)
            }
            None => {
                selected.push(id.to_string());
                Ok(true)
            }
        }
    }

    /// Turn the current selection into a cart line.
    ///
    /// On failure the selection is left as it was.
    pub fn confirm_selection(&mut self) -> Result<CartEntryId, ComposerError> {
        let flavor = self
            .pending
            .selected_flavor
            .as_deref()
            .ok_or(ComposerError::NoFlavorSelected)?;

        let got = self.pending.selected_ingredients.len();
        if self.menu.is_combo(flavor) && got != COMBO_COMPONENTS {
            return Err(ComposerError::InvalidSelection {
                flavor: flavor.to_string(),
                expected: COMBO_COMPONENTS,
                got,
            });
        }

        let flavor = self.pending.selected_flavor.take().unwrap_or_default();
        let ingredients = std::mem::take(&mut self.pending.selected_ingredients);
        let id = CartEntryId(self.next_entry);
        self.next_entry += 1;

        self.pending.cart.push(CartEntry {
            id,
            item: LineItem::new(flavor, ingredients),
        });
        Ok(id)
    }

    /// Remove exactly the referenced cart line.
    pub fn remove_from_cart(&mut self, id: CartEntryId) -> Option<LineItem> {
        let pos = self.pending.cart.iter().position(|e| e.id == id)?;
        Some(self.pending.cart.remove(pos).item)
    }

    /// Current cart total, recomputed from the lines.
    pub fn total(&self) -> Money {
        compute_total(&self.menu, self.pending.cart.iter().map(|e| &e.item))
    }

    /// Submit the cart for `customer_name`.
    ///
    /// The pending order is cleared only once the order has been handed to
    /// the sink.
    pub fn submit<S>(&mut self, customer_name: &str, sink: &mut S) -> Result<Order, ComposerError>
    where
        S: OrderSink + ?Sized,
    {
        let name = customer_name.trim();
        if name.is_empty() {
            return Err(ComposerError::EmptyName);
        }
        if self.pending.cart.is_empty() {
            return Err(ComposerError::EmptyCart);
        }

        let items: Vec<LineItem> = self.pending.cart.iter().map(|e| e.item.clone()).collect();
        let order = Order::new(name, items, self.total());

        sink.send_text(encode(&order)?)?;

        info!(
            customer = %order.customer_name,
            items = order.items.len(),
            total = %self.total(),
            "Order submitted"
        );
        self.pending = PendingOrder::default();
        Ok(order)
    }
}
