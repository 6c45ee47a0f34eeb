use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, ProductId, TransactionId, UserId};
use domain::{Money, NewOrder, NewProduct, Order, OrderItem, Product};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{MarketStore, OrderTransaction},
};

const ORDER_COLUMNS: &str =
    "id, buyer_id, seller_id, total_cents, status, transaction_id, address, created_at";

/// PostgreSQL-backed market store implementation.
#[derive(Clone)]
pub struct PgMarketStore {
    pool: PgPool,
}

impl PgMarketStore {
    /// Creates a new PostgreSQL market store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            seller_id: UserId::new(row.try_get("seller_id")?),
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let transaction_id: Option<String> = row.try_get("transaction_id")?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            buyer_id: UserId::new(row.try_get("buyer_id")?),
            seller_id: UserId::new(row.try_get("seller_id")?),
            items: Vec::new(),
            total: Money::from_cents(row.try_get("total_cents")?),
            status: status.parse()?,
            transaction_id: transaction_id.map(TransactionId::new),
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }

    async fn load_orders(&self, sql: &str, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(sql)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        let mut orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let item_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id: i64 = row.try_get("order_id")?;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        for order in &mut orders {
            if let Some(items) = items_by_order.remove(&order.id.as_i64()) {
                order.items = items;
            }
        }

        Ok(orders)
    }
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOrderTransaction { tx }))
    }

    async fn get_product(&self, id: ProductId) -> Result<Product> {
        let row = sqlx::query(
            "SELECT id, sku, name, price_cents, quantity, seller_id FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::ProductNotFound { product_id: id }),
        }
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (sku, name, price_cents, quantity, seller_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sku, name, price_cents, quantity, seller_id
            "#,
        )
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.quantity as i32)
        .bind(product.seller_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn find_orders_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE seller_id = $1 ORDER BY id ASC"
        );
        self.load_orders(&sql, seller_id).await
    }

    async fn find_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY id ASC"
        );
        self.load_orders(&sql, buyer_id).await
    }
}

struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn product(&mut self, id: ProductId) -> Result<Product> {
        let row = sqlx::query(
            "SELECT id, sku, name, price_cents, quantity, seller_id FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => PgMarketStore::row_to_product(row),
            None => Err(StoreError::ProductNotFound { product_id: id }),
        }
    }

    async fn transaction_id_in_use(&mut self, transaction_id: &TransactionId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE transaction_id = $1)")
                .bind(transaction_id.as_str())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> Result<()> {
        // The guarded update is the one atomic reservation primitive:
        // the WHERE clause makes the database serialize concurrent
        // decrements on the same row, so stock can never go negative.
        let result =
            sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2")
                .bind(id.as_i64())
                .bind(quantity as i32)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            let available: Option<i32> =
                sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                    .bind(id.as_i64())
                    .fetch_optional(&mut *self.tx)
                    .await?;

            return Err(match available {
                Some(available) => StoreError::InsufficientStock {
                    product_id: id,
                    requested: quantity,
                    available: available as u32,
                },
                None => StoreError::ProductNotFound { product_id: id },
            });
        }

        tracing::debug!(product_id = %id, quantity, "stock reserved");
        Ok(())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (buyer_id, seller_id, total_cents, status, transaction_id, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(order.buyer_id.as_i64())
        .bind(order.seller_id.as_i64())
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.transaction_id.as_ref().map(TransactionId::as_str))
        .bind(order.address.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            // The partial unique index on transaction_id is the
            // authoritative idempotency enforcement; a violation means
            // a concurrent submission won the race.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_transaction_id_key")
                && let Some(ref transaction_id) = order.transaction_id
            {
                return StoreError::DuplicateTransaction {
                    transaction_id: transaction_id.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        let order_id = OrderId::new(row.try_get("id")?);
        let created_at = row.try_get("created_at")?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(item.quantity as i32)
            .bind(item.unit_price.cents())
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(Order {
            id: order_id,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            items: order.items,
            total: order.total,
            status: order.status,
            transaction_id: order.transaction_id,
            address: order.address,
            created_at,
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
