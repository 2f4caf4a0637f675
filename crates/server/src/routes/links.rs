//! Routes beyond plain CRUD: invoice/sales-order links, procurement children
//! and shipment tracking.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use service::resources::procurement::{ItemSalesResponse, SupplyItemResponse};
use service::resources::sales::{InvoiceRequest, InvoiceResponse, SalesOrderResponse};
use service::resources::shipping::TrackingInfoResponse;
use service::resources::{Invoices, Procurements, TrackingInfos};
use service::{Actor, Store};
use tracing::info;
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/invoices/issue", post(issue_invoice::<S>))
        .route("/api/invoices/:id/sales-orders", get(invoice_orders::<S>))
        .route(
            "/api/invoices/:id/sales-orders/:order_id",
            post(attach_order::<S>).delete(detach_order::<S>),
        )
        .route("/api/procurements/:id/supply-items", get(procurement_supplies::<S>))
        .route("/api/procurements/:id/item-sales", get(procurement_sales::<S>))
        .route("/api/shipments/:id/tracking", get(shipment_tracking::<S>))
}

/// Create an invoice and mail the customers of its orders.
async fn issue_invoice<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), JsonApiError> {
    let (invoice, handles) = state
        .service::<Invoices>()
        .issue_and_notify(&actor, request, state.mailer.clone())
        .await?;
    info!(invoice = %invoice.id, mails = handles.len(), "invoice issued via api");
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn invoice_orders<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SalesOrderResponse>>, JsonApiError> {
    Ok(Json(state.service::<Invoices>().find_sales_orders(id).await?))
}

async fn attach_order<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InvoiceResponse>, JsonApiError> {
    Ok(Json(state.service::<Invoices>().attach_sales_order(&actor, id, order_id).await?))
}

async fn detach_order<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InvoiceResponse>, JsonApiError> {
    Ok(Json(state.service::<Invoices>().detach_sales_order(&actor, id, order_id).await?))
}

async fn procurement_supplies<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SupplyItemResponse>>, JsonApiError> {
    Ok(Json(state.service::<Procurements>().find_supply_items(id).await?))
}

async fn procurement_sales<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ItemSalesResponse>>, JsonApiError> {
    Ok(Json(state.service::<Procurements>().find_item_sales(id).await?))
}

async fn shipment_tracking<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingInfoResponse>, JsonApiError> {
    Ok(Json(state.service::<TrackingInfos>().find_tracking_for_shipment(id).await?))
}
