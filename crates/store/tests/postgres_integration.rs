//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and are
//! serialized because each one truncates the tables. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{ProductId, TransactionId, UserId};
use domain::{Money, NewOrder, NewProduct, OrderItem, OrderStatus, Product};
use serial_test::serial;
use sqlx::PgPool;
use store::{InMemoryMarketStore, MarketStore, PgMarketStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for schema setup
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_marketplace_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PgMarketStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PgMarketStore::new(pool)
}

async fn seed_product(store: &PgMarketStore, sku: &str, quantity: u32, seller: i64) -> Product {
    store
        .insert_product(NewProduct::new(
            sku,
            format!("Product {sku}"),
            Money::from_cents(1000),
            quantity,
            UserId::new(seller),
        ))
        .await
        .unwrap()
}

fn order_for(product: &Product, buyer: i64, quantity: u32) -> NewOrder {
    let item = OrderItem::new(product.id, quantity, product.price);
    NewOrder {
        buyer_id: UserId::new(buyer),
        seller_id: product.seller_id,
        total: item.subtotal(),
        items: vec![item],
        status: OrderStatus::Pending,
        transaction_id: None,
        address: None,
    }
}

#[tokio::test]
#[serial]
async fn insert_and_get_product() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 5, 10).await;

    let found = store.get_product(product.id).await.unwrap();
    assert_eq!(found, product);

    let missing = store.get_product(ProductId::new(9999)).await;
    assert!(matches!(missing, Err(StoreError::ProductNotFound { .. })));
}

#[tokio::test]
#[serial]
async fn guarded_update_decrements_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 5, 10).await;

    let mut tx = store.begin().await.unwrap();
    tx.reserve_stock(product.id, 3).await.unwrap();
    tx.commit().await.unwrap();

    let after = store.get_product(product.id).await.unwrap();
    assert_eq!(after.quantity, 2);
}

#[tokio::test]
#[serial]
async fn guarded_update_rejects_insufficient_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 2, 10).await;

    let mut tx = store.begin().await.unwrap();
    let result = tx.reserve_stock(product.id, 3).await;

    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            requested: 3,
            available: 2,
            ..
        })
    ));
    drop(tx);

    let after = store.get_product(product.id).await.unwrap();
    assert_eq!(after.quantity, 2);
}

#[tokio::test]
#[serial]
async fn reserving_unknown_product_reports_not_found() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let result = tx.reserve_stock(ProductId::new(9999), 1).await;
    assert!(matches!(result, Err(StoreError::ProductNotFound { .. })));
}

#[tokio::test]
#[serial]
async fn dropped_transaction_rolls_back_everything() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 5, 10).await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.reserve_stock(product.id, 5).await.unwrap();
        tx.insert_order(order_for(&product, 1, 5)).await.unwrap();
        // Dropped without commit.
    }

    let after = store.get_product(product.id).await.unwrap();
    assert_eq!(after.quantity, 5);

    let orders = store.find_orders_by_buyer(UserId::new(1)).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
#[serial]
async fn unique_index_rejects_duplicate_transaction_id() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 5, 10).await;

    let mut order = order_for(&product, 1, 1);
    order.transaction_id = Some(TransactionId::new("tx-dup"));

    let mut tx = store.begin().await.unwrap();
    assert!(
        !tx.transaction_id_in_use(&TransactionId::new("tx-dup"))
            .await
            .unwrap()
    );
    tx.insert_order(order.clone()).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(
        tx.transaction_id_in_use(&TransactionId::new("tx-dup"))
            .await
            .unwrap()
    );
    let result = tx.insert_order(order).await;
    assert!(matches!(
        result,
        Err(StoreError::DuplicateTransaction { transaction_id })
            if transaction_id.as_str() == "tx-dup"
    ));
}

#[tokio::test]
#[serial]
async fn orders_without_transaction_id_do_not_collide() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 5, 10).await;

    for buyer in 1..=2 {
        let mut tx = store.begin().await.unwrap();
        tx.insert_order(order_for(&product, buyer, 1)).await.unwrap();
        tx.commit().await.unwrap();
    }

    let orders = store
        .find_orders_by_seller(product.seller_id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
}

#[tokio::test]
#[serial]
async fn concurrent_reservations_never_oversell() {
    let store = get_test_store().await;
    let product = seed_product(&store, "SKU-001", 3, 10).await;

    let mut handles = Vec::new();
    for buyer in 0..6_i64 {
        let store = store.clone();
        let product = product.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = store.begin().await?;
            tx.reserve_stock(product.id, 1).await?;
            tx.insert_order(order_for(&product, buyer, 1)).await?;
            tx.commit().await?;
            Ok::<(), StoreError>(())
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(StoreError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(insufficient, 3);

    let after = store.get_product(product.id).await.unwrap();
    assert_eq!(after.quantity, 0);

    let orders = store
        .find_orders_by_seller(product.seller_id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 3);
}

#[tokio::test]
#[serial]
async fn find_orders_loads_line_items_in_insertion_order() {
    let store = get_test_store().await;
    let a = seed_product(&store, "SKU-A", 10, 10).await;
    let b = seed_product(&store, "SKU-B", 10, 10).await;

    let items = vec![
        OrderItem::new(b.id, 2, b.price),
        OrderItem::new(a.id, 1, a.price),
    ];
    let order = NewOrder {
        buyer_id: UserId::new(1),
        seller_id: a.seller_id,
        total: domain::pricing::order_total(&items),
        items,
        status: OrderStatus::Pending,
        transaction_id: Some(TransactionId::new("tx-items")),
        address: Some("123 Main St".to_string()),
    };

    let mut tx = store.begin().await.unwrap();
    let inserted = tx.insert_order(order).await.unwrap();
    tx.commit().await.unwrap();

    let by_buyer = store.find_orders_by_buyer(UserId::new(1)).await.unwrap();
    assert_eq!(by_buyer.len(), 1);

    let loaded = &by_buyer[0];
    assert_eq!(loaded.id, inserted.id);
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.transaction_id, Some(TransactionId::new("tx-items")));
    assert_eq!(loaded.address.as_deref(), Some("123 Main St"));
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.items[0].product_id, b.id);
    assert_eq!(loaded.items[1].product_id, a.id);
    assert_eq!(loaded.total.cents(), 3000);
}

// The in-memory store must honor the same contract the PostgreSQL
// store does, so the coordinator tests running against it stay honest.
#[tokio::test]
async fn in_memory_store_matches_postgres_contract() {
    let store = InMemoryMarketStore::new();
    let product = store
        .insert_product(NewProduct::new(
            "SKU-001",
            "Widget",
            Money::from_cents(1000),
            2,
            UserId::new(10),
        ))
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.reserve_stock(product.id, 1).await.unwrap();
    let result = tx.reserve_stock(product.id, 2).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        })
    ));
    drop(tx);

    assert_eq!(store.product_quantity(product.id).await, Some(2));
}
