//! HTTP API server for the marketplace order engine.
//!
//! Exposes order creation and the buyer/seller order listings, with
//! structured logging (tracing) and Prometheus metrics. Authentication
//! is owned by an upstream gateway; this layer only reads the identity
//! headers it injects.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::OrderCoordinator;
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/seller", get(routes::orders::list_by_seller::<S>))
        .route("/orders/buyer", get(routes::orders::list_by_buyer::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over the given store.
pub fn create_state<S: MarketStore>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        coordinator: OrderCoordinator::new(store),
    })
}
