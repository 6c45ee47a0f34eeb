//! The order creation coordinator.

use common::UserId;
use domain::{
    BuyerIdentity, NewOrder, Order, OrderItem, OrderStatus, OrderSubmission, SellerConsistency,
    pricing,
};
use store::MarketStore;

use crate::error::CheckoutError;

/// Coordinates one order submission through validation, reservation and
/// persistence.
///
/// The flow is two-phase: every line item is validated (product lookup,
/// stock precheck, seller consistency, price snapshot) before any stock
/// is reserved, and all writes run inside one storage transaction.
/// Stock is never consumed incrementally while iterating; a submission
/// either becomes a complete order or leaves the store untouched.
pub struct OrderCoordinator<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> OrderCoordinator<S> {
    /// Creates a coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the authenticated buyer.
    ///
    /// On success the returned order is persisted with status
    /// `Pending` and stock is decremented for every line. On any
    /// failure nothing is persisted and no stock changes.
    #[tracing::instrument(skip(self, submission), fields(buyer_id = %buyer.id))]
    pub async fn place_order(
        &self,
        buyer: BuyerIdentity,
        submission: OrderSubmission,
    ) -> Result<Order, CheckoutError> {
        let result = self.try_place_order(buyer, submission).await;

        match &result {
            Ok(order) => {
                metrics::counter!("checkout_orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total, "order placed");
            }
            Err(err) => {
                metrics::counter!("checkout_orders_rejected_total", "kind" => err.kind())
                    .increment(1);
                tracing::warn!(kind = err.kind(), error = %err, "order rejected");
            }
        }

        result
    }

    async fn try_place_order(
        &self,
        buyer: BuyerIdentity,
        submission: OrderSubmission,
    ) -> Result<Order, CheckoutError> {
        submission.validate()?;

        // Every step from here on shares one transaction; dropping it
        // on an error path rolls back all reservations taken so far.
        let mut tx = self.store.begin().await?;

        if let Some(ref transaction_id) = submission.transaction_id
            && tx.transaction_id_in_use(transaction_id).await?
        {
            return Err(CheckoutError::DuplicateTransaction {
                transaction_id: transaction_id.clone(),
            });
        }

        // Validation pass, in submission order. Resolves each line to a
        // product, checks stock, threads the seller accumulator and
        // captures the unit price snapshot. No stock moves yet.
        let mut sellers = SellerConsistency::new();
        let mut items = Vec::with_capacity(submission.items.len());
        for line in &submission.items {
            let product = tx.product(line.product_id).await?;

            if !product.has_stock_for(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.quantity,
                });
            }

            sellers.observe(product.seller_id)?;
            items.push(OrderItem::new(product.id, line.quantity, product.price));
        }

        let Some(seller_id) = sellers.seller() else {
            // Unreachable after validate(), but kept as a typed failure
            // rather than a panic.
            return Err(CheckoutError::Validation(
                domain::SubmissionError::EmptyItems,
            ));
        };

        // Reservation pass: all lines validated, now decrement stock
        // for every line. Ascending product id keeps two concurrent
        // multi-item orders from locking the same rows in opposite
        // order. A failure here (stock raced away since validation)
        // aborts the transaction with all earlier reservations undone.
        let mut reservations: Vec<&OrderItem> = items.iter().collect();
        reservations.sort_by_key(|item| item.product_id);
        for item in reservations {
            tx.reserve_stock(item.product_id, item.quantity).await?;
        }

        let total = pricing::order_total(&items);
        let order = tx
            .insert_order(NewOrder {
                buyer_id: buyer.id,
                seller_id,
                items,
                total,
                status: OrderStatus::Pending,
                transaction_id: submission.transaction_id,
                address: submission.address,
            })
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Returns all orders sold by the given seller.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_seller(&self, seller_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.store.find_orders_by_seller(seller_id).await?)
    }

    /// Returns all orders placed by the given buyer.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.store.find_orders_by_buyer(buyer_id).await?)
    }
}
