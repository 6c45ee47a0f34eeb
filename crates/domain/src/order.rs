//! Order entities and lifecycle status.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, TransactionId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// The status of a placed order.
///
/// Order creation always produces `Pending`; the transitions to
/// `Confirmed` and `Canceled` belong to the fulfillment flow, which
/// lives outside this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting payment confirmation.
    #[default]
    Pending,

    /// Payment confirmed.
    Confirmed,

    /// Order canceled.
    Canceled,
}

impl OrderStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized status string.
#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Confirmed" => Ok(OrderStatus::Confirmed),
            "Canceled" => Ok(OrderStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A line item of an order.
///
/// `unit_price` is the price snapshot captured when the submission was
/// validated; later catalog price changes never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product this line refers to.
    pub product_id: ProductId,

    /// Quantity ordered, at least 1.
    pub quantity: u32,

    /// Price per unit at the time the order was validated.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order line.
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns the subtotal for this line (quantity * unit_price).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A fully validated order ready to be persisted.
///
/// Carries everything the coordinator resolved during validation: the
/// single seller, the price snapshots and the precomputed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub transaction_id: Option<TransactionId>,
    pub address: Option<String>,
}

/// A persisted order.
///
/// Created exactly once, atomically, by the order creation coordinator;
/// items and price snapshots are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// The buyer who placed the order.
    pub buyer_id: UserId,

    /// The single seller all line items belong to.
    pub seller_id: UserId,

    /// Line items in submission order, non-empty.
    pub items: Vec<OrderItem>,

    /// Order total, computed once at creation.
    pub total: Money,

    /// Lifecycle status, `Pending` at creation.
    pub status: OrderStatus,

    /// Client-supplied idempotency key, unique when present.
    pub transaction_id: Option<TransactionId>,

    /// Shipping address.
    pub address: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all line items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
