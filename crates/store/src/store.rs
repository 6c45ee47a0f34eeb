//! Storage traits: the market store and its order transaction.

use async_trait::async_trait;
use common::{ProductId, TransactionId, UserId};
use domain::{NewOrder, NewProduct, Order, Product};

use crate::Result;

/// Product and order storage.
///
/// Read paths run against the shared store; every order creation goes
/// through [`MarketStore::begin`] so that validation, reservation and
/// persistence share one atomic unit.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Opens an order transaction.
    ///
    /// All writes made through the returned handle become visible only
    /// after [`OrderTransaction::commit`]; dropping the handle without
    /// committing rolls every write back.
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>>;

    /// Returns the current product snapshot.
    async fn get_product(&self, id: ProductId) -> Result<Product>;

    /// Inserts a product into the catalog.
    ///
    /// Catalog management is owned by an external service; this is its
    /// write seam, used here for seeding and tests.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Returns all orders sold by the given seller.
    async fn find_orders_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>>;

    /// Returns all orders placed by the given buyer.
    async fn find_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>>;
}

/// One order creation as a unit of work.
///
/// The coordinator drives this through validation, reservation and
/// persistence. Implementations guarantee that nothing done through the
/// handle survives unless `commit` succeeds — including mid-loop
/// failures after some reservations have already been taken.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Returns the product snapshot as seen inside this transaction.
    async fn product(&mut self, id: ProductId) -> Result<Product>;

    /// Returns true if an order with this transaction id exists.
    ///
    /// Early-exit check only; the unique index on the order table is
    /// what actually enforces idempotency at insert time.
    async fn transaction_id_in_use(&mut self, transaction_id: &TransactionId) -> Result<bool>;

    /// Atomically decrements product stock by `quantity` if and only if
    /// current stock covers it; fails with `InsufficientStock` leaving
    /// the row unchanged otherwise.
    async fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> Result<()>;

    /// Inserts the order and its line items.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Commits every write made through this handle.
    async fn commit(self: Box<Self>) -> Result<()>;
}
