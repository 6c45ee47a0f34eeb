//! Domain layer for the marketplace order engine.
//!
//! Holds the entities (products, orders, line items), the money value
//! type, the validated submission boundary type, and the pure pieces of
//! order creation: the pricing calculator and the seller consistency
//! accumulator. Nothing in this crate performs I/O.

mod money;
mod order;
pub mod pricing;
mod product;
mod seller;
mod submission;

pub use money::Money;
pub use order::{NewOrder, Order, OrderItem, OrderStatus, UnknownStatus};
pub use product::{NewProduct, Product};
pub use seller::{SellerConsistency, SellerMismatch};
pub use submission::{
    BuyerIdentity, OrderSubmission, Role, SubmissionError, SubmissionItem, MAX_ITEM_QUANTITY,
};
