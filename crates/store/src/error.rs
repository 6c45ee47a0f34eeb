use common::{ProductId, TransactionId};
use domain::UnknownStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the market store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// The conditional decrement found less stock than requested.
    /// The product row is unchanged.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// An order with this transaction id already exists. Enforced by
    /// the unique index at insert time, inside the same transaction as
    /// the insert.
    #[error("transaction id {transaction_id} is already used by an existing order")]
    DuplicateTransaction { transaction_id: TransactionId },

    /// A stored status string did not parse back into a known status.
    #[error("corrupt order row: {0}")]
    InvalidStatus(#[from] UnknownStatus),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
