use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use models::enums::AuditAction;
use models::event_log;
use serde::Deserialize;
use service::Store;
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub actor: Option<String>,
    pub action: Option<AuditAction>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/event-logs", get(list::<S>))
        .route("/api/event-logs/:entity/:id", get(for_entity::<S>))
}

/// Newest first. `action` takes precedence over `actor`; paging applies to the unfiltered list.
async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Query(q): Query<EventQuery>,
) -> Result<Json<Vec<event_log::Model>>, JsonApiError> {
    let events = match (q.action, q.actor.as_deref()) {
        (Some(action), _) => state.audit.find_by_action(action).await?,
        (None, Some(actor)) => state.audit.find_by_actor(actor).await?,
        (None, None) => {
            let page = crate::routes::crud::ListParams { page: q.page, per_page: q.per_page }.pagination();
            state.audit.find_all(page).await?
        }
    };
    Ok(Json(events))
}

async fn for_entity<S: Store>(
    State(state): State<AppState<S>>,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<event_log::Model>>, JsonApiError> {
    Ok(Json(state.audit.find_for_entity(&entity, id).await?))
}
