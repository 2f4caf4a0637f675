//! Storage seams: one generic repository instead of one interface per entity,
//! and an explicit unit of work that is either committed or rolled back.

use async_trait::async_trait;
use common::pagination::Pagination;
use models::Record;
use tracing::warn;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::query::Query;

/// Keyed lookup, filtering and writes for any [`Record`].
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_by_id<R: Record>(&self, id: Uuid) -> Result<Option<R>, ServiceError>;

    /// All rows matching the query; never fails on an empty result.
    async fn find<R: Record>(&self, query: Query<R>) -> Result<Vec<R>, ServiceError>;

    async fn insert<R: Record>(&self, record: R) -> Result<R, ServiceError>;

    /// Full overwrite of an existing row.
    async fn update<R: Record>(&self, record: R) -> Result<R, ServiceError>;

    /// Returns whether a row was removed.
    async fn delete<R: Record>(&self, id: Uuid) -> Result<bool, ServiceError>;

    async fn exists<R: Record>(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.find_by_id::<R>(id).await?.is_some())
    }

    async fn find_first<R: Record>(&self, query: Query<R>) -> Result<Option<R>, ServiceError> {
        let rows = self.find(query.paginate(Pagination::new(1, 1))).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
pub trait UnitOfWork: Repository + Sized {
    async fn commit(self) -> Result<(), ServiceError>;
    async fn rollback(self) -> Result<(), ServiceError>;
}

/// Factory of units of work.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type UnitOfWork: UnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, ServiceError>;
}

/// Commit on success, roll back on failure. The original error wins over a failed rollback.
pub async fn finish<U: UnitOfWork, T>(uow: U, outcome: Result<T, ServiceError>) -> Result<T, ServiceError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = uow.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Load a referenced row or fail with that entity's not-found error.
pub async fn require<R: Record, U: Repository>(repo: &U, id: Uuid) -> Result<R, ServiceError> {
    repo.find_by_id::<R>(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(R::NAME, id))
}
