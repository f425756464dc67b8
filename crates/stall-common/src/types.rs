//! Shared types for the stall order relay.
//!
//! CRITICAL: All money is held as integer cents in [`Money`].
//! `Decimal` only appears at the wire and display boundary.
//! NEVER use f64 for prices.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A currency amount in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from a count of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Convert from a decimal amount, rounding half away from zero to cents.
    ///
    /// Returns `None` if the amount does not fit in `i64` cents.
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        cents.to_i64().map(Self)
    }

    /// Two-decimal representation.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a decimal string such as `"10.00"` or `"7.5"`.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<Decimal>().ok().and_then(Self::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Money {
    type Output = Money;

    /// Saturates at the `i64` bounds.
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// One purchased product: a flavor plus its add-on ingredients.
///
/// For the combo flavor the "ingredients" are the three chosen component
/// flavors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub flavor: String,
    pub ingredients: Vec<String>,
}

impl LineItem {
    pub fn new(flavor: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            flavor: flavor.into(),
            ingredients,
        }
    }

    /// A line with no add-ons.
    pub fn plain(flavor: impl Into<String>) -> Self {
        Self::new(flavor, Vec::new())
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ingredients.is_empty() {
            write!(f, "{} (Sem adicionais)", self.flavor)
        } else {
            write!(f, "{} ({})", self.flavor, self.ingredients.join(", "))
        }
    }
}

/// A submitted order as seen by both clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub customer_name: String,
    pub items: Vec<LineItem>,
    /// Present only on customer-originated orders.
    pub total: Option<Money>,
    /// Loop-prevention marker, set once the cashier relays the order.
    pub forwarded: bool,
    /// Unrecognized top-level wire fields, carried through a forward untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Order {
    /// A fresh customer-originated order.
    pub fn new(customer_name: impl Into<String>, items: Vec<LineItem>, total: Money) -> Self {
        Self {
            customer_name: customer_name.into(),
            items,
            total: Some(total),
            forwarded: false,
            extra: serde_json::Map::new(),
        }
    }

    /// The kitchen-bound copy of this order: no price, marked as forwarded.
    pub fn for_kitchen(&self) -> Order {
        Order {
            total: None,
            forwarded: true,
            ..self.clone()
        }
    }
}
