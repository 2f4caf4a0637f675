//! Generic REST surface of one [`Resource`]: list/create on the collection,
//! get/replace/delete on the item, plus PDF/XLSX exports.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use common::pagination::Pagination;
use serde::Deserialize;
use service::report::ReportFormat;
use service::{Actor, Resource, Store};
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    /// Paging only when the caller asked for it.
    pub fn pagination(&self) -> Option<Pagination> {
        if self.page.is_none() && self.per_page.is_none() {
            return None;
        }
        let defaults = Pagination::default();
        Some(Pagination::new(self.page.unwrap_or(defaults.page), self.per_page.unwrap_or(defaults.per_page)))
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ReportParams {
    /// `pdf` (default) or `xlsx`
    pub format: Option<String>,
}

impl ReportParams {
    fn format(&self) -> Result<ReportFormat, JsonApiError> {
        match &self.format {
            None => Ok(ReportFormat::Pdf),
            Some(raw) => raw.parse().map_err(|e: service::report::ReportError| JsonApiError::bad_request(e.to_string())),
        }
    }
}

pub fn crud_routes<R: Resource, S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(&format!("/api/{}", R::PATH), get(list::<R, S>).post(create::<R, S>))
        .route(
            &format!("/api/{}/:id", R::PATH),
            get(fetch::<R, S>).put(replace::<R, S>).delete(remove::<R, S>),
        )
        .route(&format!("/api/reports/{}", R::PATH), get(export_all::<R, S>))
        .route(&format!("/api/reports/{}/:id", R::PATH), get(export_one::<R, S>))
}

async fn list<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<R::Response>>, JsonApiError> {
    Ok(Json(state.service::<R>().find_all(params.pagination()).await?))
}

async fn create<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<R::Request>,
) -> Result<(StatusCode, Json<R::Response>), JsonApiError> {
    let created = state.service::<R>().create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn fetch<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<R::Response>, JsonApiError> {
    Ok(Json(state.service::<R>().find_one(id).await?))
}

async fn replace<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<R::Request>,
) -> Result<Json<R::Response>, JsonApiError> {
    Ok(Json(state.service::<R>().update(&actor, id, request).await?))
}

async fn remove<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.service::<R>().delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn document(format: ReportFormat, name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{name}.{}\"", format.extension());
    (
        [(header::CONTENT_TYPE, format.content_type().to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

async fn export_all<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, JsonApiError> {
    let format = params.format()?;
    let bytes = state.service::<R>().export_all(format).await?;
    Ok(document(format, R::PATH, bytes))
}

async fn export_one<R: Resource, S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReportParams>,
) -> Result<Response, JsonApiError> {
    let format = params.format()?;
    let bytes = state.service::<R>().export_one(id, format).await?;
    Ok(document(format, &format!("{}-{id}", R::PATH), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_only_when_requested() {
        assert_eq!(ListParams::default().pagination(), None);
        let p = ListParams { page: Some(2), per_page: None }.pagination();
        assert_eq!(p, Some(Pagination::new(2, 20)));
    }

    #[test]
    fn unknown_report_format_is_a_bad_request() {
        let params = ReportParams { format: Some("docx".into()) };
        assert!(matches!(params.format(), Err(e) if e.status == StatusCode::BAD_REQUEST));
        assert_eq!(ReportParams { format: None }.format().ok(), Some(ReportFormat::Pdf));
    }
}
