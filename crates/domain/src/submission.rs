//! Typed order submission, validated once at the boundary.

use common::{ProductId, TransactionId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest per-line quantity the engine accepts.
///
/// Stock columns are 32-bit integers; capping here keeps every later
/// conversion lossless.
pub const MAX_ITEM_QUANTITY: u32 = i32::MAX as u32;

/// Role of an authenticated user, as asserted by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            _ => Err(()),
        }
    }
}

/// Identity of the submitting user, supplied by the authentication
/// layer. The role is carried through but not re-validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyerIdentity {
    pub id: UserId,
    pub role: Role,
}

impl BuyerIdentity {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// One requested line of an order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl SubmissionItem {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// An order submission as received from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    /// Client-supplied idempotency key. Absent means no dedup.
    pub transaction_id: Option<TransactionId>,

    /// Shipping address.
    pub address: Option<String>,

    /// Requested lines, must be non-empty.
    pub items: Vec<SubmissionItem>,
}

impl OrderSubmission {
    /// Creates a plain submission with no transaction id or address.
    pub fn new(items: Vec<SubmissionItem>) -> Self {
        Self {
            transaction_id: None,
            address: None,
            items,
        }
    }

    /// Attaches an idempotency key.
    pub fn with_transaction_id(mut self, transaction_id: impl Into<TransactionId>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Attaches a shipping address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Validates the submission shape before it enters the coordinator.
    ///
    /// Checks only what can be decided without storage access: the item
    /// list must be non-empty and every quantity must be within bounds.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.items.is_empty() {
            return Err(SubmissionError::EmptyItems);
        }

        for item in &self.items {
            if item.quantity == 0 {
                return Err(SubmissionError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
            if item.quantity > MAX_ITEM_QUANTITY {
                return Err(SubmissionError::QuantityTooLarge {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }

        Ok(())
    }
}

/// Errors from malformed submissions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The item list was empty.
    #[error("order must contain at least one item")]
    EmptyItems,

    /// A line carried a non-positive quantity.
    #[error("invalid quantity {quantity} for product {product_id} (must be at least 1)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A line quantity exceeds what the inventory store can represent.
    #[error("quantity {quantity} for product {product_id} exceeds the supported maximum")]
    QuantityTooLarge { product_id: ProductId, quantity: u32 },
}
