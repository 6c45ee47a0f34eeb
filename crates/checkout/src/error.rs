//! Checkout error taxonomy.

use common::{ProductId, TransactionId};
use domain::{SellerMismatch, SubmissionError};
use store::StoreError;
use thiserror::Error;

/// Errors that abort an order creation.
///
/// Every variant aborts the whole order atomically: no half-created
/// order and no partially decremented stock is ever left behind.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The submission was malformed (empty item list, bad quantity).
    #[error("invalid order submission: {0}")]
    Validation(#[from] SubmissionError),

    /// The transaction id was already used; the original order is
    /// authoritative and the submission must not be retried as-is.
    #[error("transaction id {transaction_id} has already been used")]
    DuplicateTransaction { transaction_id: TransactionId },

    /// A referenced product does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// Requested quantity exceeded available stock.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Line items resolved to more than one seller; the caller must
    /// split the submission into one order per seller.
    #[error("order spans multiple sellers: {0}")]
    MixedSellerOrder(#[from] SellerMismatch),

    /// The storage transaction failed; nothing was persisted, so the
    /// submission is safe to retry.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl CheckoutError {
    /// Stable label for the failure kind, used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::DuplicateTransaction { .. } => "duplicate_transaction",
            CheckoutError::ProductNotFound { .. } => "product_not_found",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::MixedSellerOrder(_) => "mixed_seller",
            CheckoutError::Storage(_) => "storage",
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound { product_id } => {
                CheckoutError::ProductNotFound { product_id }
            }
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::DuplicateTransaction { transaction_id } => {
                CheckoutError::DuplicateTransaction { transaction_id }
            }
            other => CheckoutError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;

    #[test]
    fn store_errors_map_to_specific_kinds() {
        let err: CheckoutError = StoreError::ProductNotFound {
            product_id: ProductId::new(1),
        }
        .into();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));

        let err: CheckoutError = StoreError::InsufficientStock {
            product_id: ProductId::new(1),
            requested: 3,
            available: 1,
        }
        .into();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        let err: CheckoutError = StoreError::DuplicateTransaction {
            transaction_id: TransactionId::new("tx-1"),
        }
        .into();
        assert!(matches!(err, CheckoutError::DuplicateTransaction { .. }));
    }

    #[test]
    fn kinds_are_stable_labels() {
        let err = CheckoutError::MixedSellerOrder(SellerMismatch {
            expected: UserId::new(1),
            found: UserId::new(2),
        });
        assert_eq!(err.kind(), "mixed_seller");
        assert_eq!(
            err.to_string(),
            "order spans multiple sellers: all items must belong to seller 1, but found seller 2"
        );
    }
}
