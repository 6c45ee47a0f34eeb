//! Order creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::OrderCoordinator;
use common::{ProductId, TransactionId};
use domain::{Order, OrderSubmission, SubmissionItem};
use serde::{Deserialize, Serialize};
use store::MarketStore;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub coordinator: OrderCoordinator<S>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub transaction_id: Option<String>,
    pub address: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.as_i64(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect();

        OrderResponse {
            id: order.id.as_i64(),
            buyer_id: order.buyer_id.as_i64(),
            seller_id: order.seller_id.as_i64(),
            items,
            total_cents: order.total.cents(),
            status: order.status.to_string(),
            transaction_id: order.transaction_id.map(|t| t.as_str().to_string()),
            address: order.address,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the authenticated buyer.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let submission = OrderSubmission {
        transaction_id: req.transaction_id.map(TransactionId::new),
        address: req.address,
        items: req
            .items
            .iter()
            .map(|item| SubmissionItem::new(ProductId::new(item.product_id), item.quantity))
            .collect(),
    };

    let order = state.coordinator.place_order(user.0, submission).await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/seller — list orders sold by the authenticated user.
#[tracing::instrument(skip(state))]
pub async fn list_by_seller<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.coordinator.orders_for_seller(user.0.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/buyer — list orders placed by the authenticated user.
#[tracing::instrument(skip(state))]
pub async fn list_by_buyer<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.coordinator.orders_for_buyer(user.0.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
