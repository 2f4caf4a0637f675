pub mod audit;
pub mod auth;
pub mod crud;
pub mod links;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use common::types::Health;
use service::resources::{
    Accounts, Customers, DeliveryItems, Employees, InboundDeliveries, InventoryItems, Invoices, ItemSales,
    JournalEntries, MaterialTransactions, Procurements, ProductionOrders, QualityChecks, SalesOrders, Shifts,
    Shipments, SupplyItems, TrackingInfos,
};
use service::{Resource, Store};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;
use self::crud::crud_routes;

/// Collection path segments of every CRUD resource, in mount order.
pub const RESOURCE_PATHS: &[&str] = &[
    Accounts::PATH,
    Customers::PATH,
    InventoryItems::PATH,
    MaterialTransactions::PATH,
    JournalEntries::PATH,
    SalesOrders::PATH,
    Invoices::PATH,
    InboundDeliveries::PATH,
    DeliveryItems::PATH,
    Shipments::PATH,
    TrackingInfos::PATH,
    Procurements::PATH,
    SupplyItems::PATH,
    ItemSales::PATH,
    ProductionOrders::PATH,
    QualityChecks::PATH,
    Employees::PATH,
    Shifts::PATH,
];

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> (StatusCode, Json<utoipa::openapi::OpenApi>) {
    (StatusCode::OK, Json(crate::openapi::document()))
}

fn resource_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .merge(crud_routes::<Accounts, S>())
        .merge(crud_routes::<Customers, S>())
        .merge(crud_routes::<InventoryItems, S>())
        .merge(crud_routes::<MaterialTransactions, S>())
        .merge(crud_routes::<JournalEntries, S>())
        .merge(crud_routes::<SalesOrders, S>())
        .merge(crud_routes::<Invoices, S>())
        .merge(crud_routes::<InboundDeliveries, S>())
        .merge(crud_routes::<DeliveryItems, S>())
        .merge(crud_routes::<Shipments, S>())
        .merge(crud_routes::<TrackingInfos, S>())
        .merge(crud_routes::<Procurements, S>())
        .merge(crud_routes::<SupplyItems, S>())
        .merge(crud_routes::<ItemSales, S>())
        .merge(crud_routes::<ProductionOrders, S>())
        .merge(crud_routes::<QualityChecks, S>())
        .merge(crud_routes::<Employees, S>())
        .merge(crud_routes::<Shifts, S>())
}

/// Build the full application router: public health/docs/auth routes and
/// token-protected resource routes.
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/refresh", post(auth::refresh::<S>));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout::<S>))
        .merge(resource_routes::<S>())
        .merge(links::routes::<S>())
        .merge(audit::routes::<S>())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth::<S>));

    public
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
