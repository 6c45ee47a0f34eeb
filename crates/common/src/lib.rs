//! Shared identifier types used across the marketplace order engine.

mod types;

pub use types::{OrderId, ProductId, TransactionId, UserId};
