//! Generic create/read/update/delete over any [`Resource`].
//!
//! Each write runs in one unit of work: validation, reference checks, the
//! write itself, link maintenance and the audit row either all commit or
//! all roll back.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use common::metrics;
use common::pagination::Pagination;
use models::enums::AuditAction;
use models::{ColumnOf, Record};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::audit::{now, record_event, Actor};
use crate::errors::ServiceError;
use crate::query::{Predicate, Query};
use crate::report::{render, ReportFormat, ReportTable};
use crate::repository::{finish, require, Repository, Store};

/// Binds a record type to its request and response shapes and to the rules
/// that run around writes.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Record: Record;
    type Request: Validate + DeserializeOwned + Debug + Send + Sync + 'static;
    type Response: Serialize + Debug + Clone + Send + Sync + 'static;

    /// Path segment under `/api`.
    const PATH: &'static str;

    /// Identifier carried in a request body, compared against the path id on update.
    fn body_id(request: &Self::Request) -> Option<Uuid>;

    fn create(id: Uuid, now: DateTimeWithTimeZone, request: &Self::Request) -> Self::Record;

    fn overwrite(existing: Self::Record, now: DateTimeWithTimeZone, request: &Self::Request) -> Self::Record;

    fn to_response(record: Self::Record) -> Self::Response;

    /// Reference and uniqueness checks. `current` is the id under update.
    async fn resolve<U: Repository>(
        _repo: &U,
        _request: &Self::Request,
        _current: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Maintain rows owned by other entities once the record is written.
    async fn after_write<U: Repository>(
        _repo: &U,
        _record: &Self::Record,
        _request: &Self::Request,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn before_delete<U: Repository>(_repo: &U, _record: &Self::Record) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Fill response fields that live on other entities.
    async fn enrich<U: Repository>(_repo: &U, _response: &mut Self::Response) -> Result<(), ServiceError> {
        Ok(())
    }
}

pub struct CrudService<R: Resource, S: Store> {
    store: Arc<S>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource, S: Store> Clone for CrudService<R, S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), _resource: PhantomData }
    }
}

pub(crate) fn observe<T>(entity: &'static str, operation: &'static str, outcome: Result<T, ServiceError>) -> Result<T, ServiceError> {
    metrics::record_operation(entity, operation, outcome.is_ok());
    if let Err(e) = &outcome {
        debug!(entity, operation, error = %e, "operation_failed");
    }
    outcome
}

impl<R: Resource, S: Store> CrudService<R, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, _resource: PhantomData }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn name() -> &'static str {
        <R::Record as Record>::NAME
    }

    pub(crate) async fn respond<U: Repository>(repo: &U, record: R::Record) -> Result<R::Response, ServiceError> {
        let mut response = R::to_response(record);
        R::enrich(repo, &mut response).await?;
        Ok(response)
    }

    pub(crate) async fn respond_all<U: Repository>(repo: &U, records: Vec<R::Record>) -> Result<Vec<R::Response>, ServiceError> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(Self::respond(repo, record).await?);
        }
        Ok(out)
    }

    #[instrument(skip(self, request), fields(entity = Self::name(), actor = %actor))]
    pub async fn create(&self, actor: &Actor, request: R::Request) -> Result<R::Response, ServiceError> {
        let outcome = async {
            request.validate()?;
            let uow = self.store.begin().await?;
            let outcome = Self::create_in(&uow, actor, &request).await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "create", outcome)
    }

    pub async fn create_in<U: Repository>(
        repo: &U,
        actor: &Actor,
        request: &R::Request,
    ) -> Result<R::Response, ServiceError> {
        R::resolve(repo, request, None).await?;
        let record = repo.insert(R::create(Uuid::new_v4(), now(), request)).await?;
        R::after_write(repo, &record, request).await?;
        record_event(repo, actor, AuditAction::Create, Self::name(), Some(record.id()), None).await?;
        info!(id = %record.id(), "record_created");
        Self::respond(repo, record).await
    }

    /// Full overwrite. A body id that differs from `id` is rejected before any storage access.
    #[instrument(skip(self, request), fields(entity = Self::name(), actor = %actor, id = %id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, request: R::Request) -> Result<R::Response, ServiceError> {
        let outcome = async {
            if let Some(body_id) = R::body_id(&request) {
                if body_id != id {
                    return Err(ServiceError::validation(format!(
                        "path id {id} does not match body id {body_id}"
                    )));
                }
            }
            request.validate()?;
            let uow = self.store.begin().await?;
            let outcome = Self::update_in(&uow, actor, id, &request).await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "update", outcome)
    }

    pub async fn update_in<U: Repository>(
        repo: &U,
        actor: &Actor,
        id: Uuid,
        request: &R::Request,
    ) -> Result<R::Response, ServiceError> {
        let existing = require::<R::Record, U>(repo, id).await?;
        R::resolve(repo, request, Some(id)).await?;
        let record = repo.update(R::overwrite(existing, now(), request)).await?;
        R::after_write(repo, &record, request).await?;
        record_event(repo, actor, AuditAction::Update, Self::name(), Some(id), None).await?;
        info!("record_updated");
        Self::respond(repo, record).await
    }

    /// Delete by id; a missing row is reported without attempting the delete.
    #[instrument(skip(self), fields(entity = Self::name(), actor = %actor, id = %id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        let outcome = async {
            let uow = self.store.begin().await?;
            let outcome = Self::delete_in(&uow, actor, id).await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "delete", outcome)
    }

    pub async fn delete_in<U: Repository>(repo: &U, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        let existing = require::<R::Record, U>(repo, id).await?;
        R::before_delete(repo, &existing).await?;
        repo.delete::<R::Record>(id).await?;
        record_event(repo, actor, AuditAction::Delete, Self::name(), Some(id), None).await?;
        info!("record_deleted");
        Ok(())
    }

    pub async fn find_one(&self, id: Uuid) -> Result<R::Response, ServiceError> {
        let outcome = async {
            let uow = self.store.begin().await?;
            let outcome = async {
                let record = require::<R::Record, _>(&uow, id).await?;
                Self::respond(&uow, record).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "find_one", outcome)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        let uow = self.store.begin().await?;
        let outcome = uow.exists::<R::Record>(id).await;
        finish(uow, outcome).await
    }

    /// Every row, optionally paged. An empty table yields an empty list.
    pub async fn find_all(&self, page: Option<Pagination>) -> Result<Vec<R::Response>, ServiceError> {
        let mut query = Query::new();
        if let Some(page) = page {
            query = query.paginate(page);
        }
        self.find_by(query).await
    }

    /// Filtered rows; no match yields an empty list.
    pub async fn find_by(&self, query: Query<R::Record>) -> Result<Vec<R::Response>, ServiceError> {
        let outcome = async {
            let uow = self.store.begin().await?;
            let outcome = async {
                let rows = uow.find(query).await?;
                Self::respond_all(&uow, rows).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "find", outcome)
    }

    /// Exactly-one lookup by a natural key; no match is not-found under `key`.
    pub async fn find_single(&self, query: Query<R::Record>, key: impl ToString) -> Result<R::Response, ServiceError> {
        let key = key.to_string();
        let outcome = async {
            let uow = self.store.begin().await?;
            let outcome = async {
                let record = uow
                    .find_first(query)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(Self::name(), key))?;
                Self::respond(&uow, record).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "find_single", outcome)
    }

    /// Two-step relational filter: rows whose `fk` points at any parent matching `parents`.
    pub async fn find_related<P: Record>(
        &self,
        parents: Query<P>,
        fk: ColumnOf<R::Record>,
    ) -> Result<Vec<R::Response>, ServiceError> {
        let outcome = async {
            let uow = self.store.begin().await?;
            let outcome = async {
                let ids: Vec<Uuid> = uow.find(parents).await?.iter().map(Record::id).collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let rows = uow.find(Query::new().filter(Predicate::is_in(fk, ids))).await?;
                Self::respond_all(&uow, rows).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(Self::name(), "find_related", outcome)
    }

    /// Render one row as a single-record document.
    pub async fn export_one(&self, id: Uuid, format: ReportFormat) -> Result<Vec<u8>, ServiceError> {
        let response = self.find_one(id).await?;
        let table = ReportTable::from_record(R::PATH, &response)?;
        Ok(render(&table, format)?)
    }

    pub async fn export_all(&self, format: ReportFormat) -> Result<Vec<u8>, ServiceError> {
        let rows = self.find_all(None).await?;
        let table = ReportTable::from_records(R::PATH, &rows)?;
        Ok(render(&table, format)?)
    }
}
