//! Postgres-backed store: a unit of work is one `DatabaseTransaction`.

use async_trait::async_trait;
use models::Record;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::query::Query;
use crate::repository::{Repository, Store, UnitOfWork};

type EntityOf<R> = <R as ModelTrait>::Entity;

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub struct SeaOrmUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl Store for SeaOrmStore {
    type UnitOfWork = SeaOrmUnitOfWork;

    async fn begin(&self) -> Result<SeaOrmUnitOfWork, ServiceError> {
        Ok(SeaOrmUnitOfWork { txn: self.db.begin().await? })
    }
}

async fn select<R: Record, C: ConnectionTrait>(conn: &C, query: Query<R>) -> Result<Vec<R>, ServiceError> {
    let mut select = <EntityOf<R> as EntityTrait>::find().filter(query.condition());
    if let Some((col, direction)) = query.ordering() {
        select = select.order_by(col, direction.into());
    }
    if let Some(page) = query.page() {
        let (_, per_page) = page.normalize();
        select = select.offset(page.offset()).limit(per_page);
    }
    Ok(select.into_model::<R>().all(conn).await?)
}

async fn select_by_id<R: Record, C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<R>, ServiceError> {
    let found = <EntityOf<R> as EntityTrait>::find()
        .filter(R::id_column().eq(id))
        .into_model::<R>()
        .one(conn)
        .await?;
    Ok(found)
}

async fn insert_row<R: Record, C: ConnectionTrait>(conn: &C, record: R) -> Result<R, ServiceError> {
    <EntityOf<R> as EntityTrait>::insert(record.to_active_model()).exec(conn).await?;
    Ok(record)
}

async fn overwrite_row<R: Record, C: ConnectionTrait>(conn: &C, record: R) -> Result<R, ServiceError> {
    let res = <EntityOf<R> as EntityTrait>::update_many()
        .set(record.to_active_model())
        .filter(R::id_column().eq(record.id()))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found(R::NAME, record.id()));
    }
    Ok(record)
}

async fn delete_row<R: Record, C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, ServiceError> {
    let res = <EntityOf<R> as EntityTrait>::delete_many()
        .filter(R::id_column().eq(id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

#[async_trait]
impl Repository for SeaOrmUnitOfWork {
    async fn find_by_id<R: Record>(&self, id: Uuid) -> Result<Option<R>, ServiceError> {
        select_by_id(&self.txn, id).await
    }

    async fn find<R: Record>(&self, query: Query<R>) -> Result<Vec<R>, ServiceError> {
        select(&self.txn, query).await
    }

    async fn insert<R: Record>(&self, record: R) -> Result<R, ServiceError> {
        insert_row(&self.txn, record).await
    }

    async fn update<R: Record>(&self, record: R) -> Result<R, ServiceError> {
        overwrite_row(&self.txn, record).await
    }

    async fn delete<R: Record>(&self, id: Uuid) -> Result<bool, ServiceError> {
        delete_row::<R, _>(&self.txn, id).await
    }
}

#[async_trait]
impl UnitOfWork for SeaOrmUnitOfWork {
    async fn commit(self) -> Result<(), ServiceError> {
        Ok(self.txn.commit().await?)
    }

    async fn rollback(self) -> Result<(), ServiceError> {
        Ok(self.txn.rollback().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use chrono::Utc;
    use models::{account, enums::AccountType};
    use rust_decimal::Decimal;

    use crate::query::Predicate;

    #[tokio::test]
    async fn rolled_back_rows_are_not_visible() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else {
            return Ok(());
        };
        let store = SeaOrmStore::new(db);
        let now = Utc::now().into();
        let acc = account::Model {
            id: Uuid::new_v4(),
            account_number: format!("RB-{}", Uuid::new_v4().simple()),
            name: "Rollback".into(),
            account_type: AccountType::Asset,
            balance: Decimal::new(5, 0),
            currency: "EUR".into(),
            created_at: now,
            updated_at: now,
        };

        let uow = store.begin().await?;
        uow.insert(acc.clone()).await?;
        let seen = uow
            .find(Query::new().filter(Predicate::<account::Model>::eq(account::Column::AccountNumber, acc.account_number.clone())))
            .await?;
        assert_eq!(seen.len(), 1);
        uow.rollback().await?;

        let uow = store.begin().await?;
        assert!(uow.find_by_id::<account::Model>(acc.id).await?.is_none());
        uow.rollback().await?;
        Ok(())
    }
}
