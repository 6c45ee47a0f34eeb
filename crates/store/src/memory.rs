use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, TransactionId, UserId};
use domain::{Money, NewOrder, NewProduct, Order, Product};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    store::{MarketStore, OrderTransaction},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    orders: Vec<Order>,
    next_product_id: i64,
    next_order_id: i64,
}

/// In-memory market store implementation for testing.
///
/// Provides the same interface and atomicity contract as the PostgreSQL
/// implementation: an order transaction holds the store lock for its
/// whole lifetime and works on a scratch copy of the state, so writes
/// become visible all at once on commit and vanish on drop.
#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryMarketStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the current stock level of a product.
    pub async fn product_quantity(&self, id: ProductId) -> Option<u32> {
        self.state.lock().await.products.get(&id).map(|p| p.quantity)
    }

    /// Overwrites a product's catalog price. Test hook for exercising
    /// price-snapshot behavior.
    pub async fn set_price(&self, id: ProductId, price: Money) {
        if let Some(product) = self.state.lock().await.products.get_mut(&id) {
            product.price = price;
        }
    }

    /// Overwrites a product's stock level. Test hook.
    pub async fn set_quantity(&self, id: ProductId, quantity: u32) {
        if let Some(product) = self.state.lock().await.products.get_mut(&id) {
            product.quantity = quantity;
        }
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>> {
        // Holding the owned guard until commit/drop serializes order
        // transactions, mirroring the row-level serialization the
        // database gives the guarded update.
        let guard = Arc::clone(&self.state).lock_owned().await;
        let scratch = guard.clone();
        Ok(Box::new(InMemoryOrderTransaction { guard, scratch }))
    }

    async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.state
            .lock()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound { product_id: id })
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let product = Product {
            id: ProductId::new(state.next_product_id),
            sku: product.sku,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            seller_id: product.seller_id,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_orders_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.seller_id == seller_id)
            .cloned()
            .collect())
    }

    async fn find_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect())
    }
}

struct InMemoryOrderTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    scratch: MemoryState,
}

#[async_trait]
impl OrderTransaction for InMemoryOrderTransaction {
    async fn product(&mut self, id: ProductId) -> Result<Product> {
        self.scratch
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound { product_id: id })
    }

    async fn transaction_id_in_use(&mut self, transaction_id: &TransactionId) -> Result<bool> {
        Ok(self
            .scratch
            .orders
            .iter()
            .any(|o| o.transaction_id.as_ref() == Some(transaction_id)))
    }

    async fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> Result<()> {
        let product = self
            .scratch
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound { product_id: id })?;

        if product.quantity < quantity {
            return Err(StoreError::InsufficientStock {
                product_id: id,
                requested: quantity,
                available: product.quantity,
            });
        }

        product.quantity -= quantity;
        Ok(())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        // Unique constraint simulation, as the partial unique index on
        // the order table does in PostgreSQL.
        if let Some(ref transaction_id) = order.transaction_id
            && self
                .scratch
                .orders
                .iter()
                .any(|o| o.transaction_id.as_ref() == Some(transaction_id))
        {
            return Err(StoreError::DuplicateTransaction {
                transaction_id: transaction_id.clone(),
            });
        }

        self.scratch.next_order_id += 1;
        let order = Order {
            id: OrderId::new(self.scratch.next_order_id),
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            items: order.items,
            total: order.total,
            status: order.status,
            transaction_id: order.transaction_id,
            address: order.address,
            created_at: Utc::now(),
        };
        self.scratch.orders.push(order.clone());
        Ok(order)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryOrderTransaction { mut guard, scratch } = *self;
        *guard = scratch;
        Ok(())
    }
}
