//! Product catalog entities as seen by the order engine.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A product snapshot read from the inventory store.
///
/// `quantity` never goes negative: the only mutation path is the atomic
/// conditional decrement performed by the reservation operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,

    /// Unique stock-keeping unit.
    pub sku: String,

    /// Human-readable product name.
    pub name: String,

    /// Current unit price.
    pub price: Money,

    /// Units currently in stock.
    pub quantity: u32,

    /// The seller who owns this product.
    pub seller_id: UserId,
}

impl Product {
    /// Returns true if current stock covers the requested quantity.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.quantity >= quantity
    }
}

/// A product to insert into the inventory store.
///
/// Catalog management is owned by an external service; this type exists
/// as the write seam that seeding and tests go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub seller_id: UserId,
}

impl NewProduct {
    /// Creates a new product description.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
        seller_id: UserId,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            price,
            quantity,
            seller_id,
        }
    }
}
