//! Process-local store keeping each record as JSON.
//!
//! A unit of work reads from a snapshot taken at `begin` and keeps a write log
//! that is replayed onto the shared tables on commit (last writer wins). Every
//! repository call is counted so tests can assert which operations ran.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use models::Record;
use serde_json::Value as Json;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::query::Query;
use crate::repository::{Repository, Store, UnitOfWork};

type Table = BTreeMap<Uuid, Json>;
type Tables = HashMap<&'static str, Table>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    FindById,
    Find,
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    calls: Arc<Mutex<HashMap<(&'static str, Operation), usize>>>,
}

enum Write {
    Put(&'static str, Uuid, Json),
    Remove(&'static str, Uuid),
}

pub struct MemoryUnitOfWork {
    store: MemoryStore,
    working: Mutex<Tables>,
    log: Mutex<Vec<Write>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, ServiceError> {
    m.lock().map_err(|_| ServiceError::Db("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a row directly into committed state, bypassing units of work and counters.
    pub fn seed<R: Record>(&self, record: &R) -> Result<(), ServiceError> {
        let value = serde_json::to_value(record)?;
        lock(&self.tables)?.entry(R::NAME).or_default().insert(record.id(), value);
        Ok(())
    }

    /// Committed row count of an entity.
    pub fn len<R: Record>(&self) -> usize {
        lock(&self.tables)
            .map(|t| t.get(R::NAME).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Committed copy of a row.
    pub fn get<R: Record>(&self, id: Uuid) -> Option<R> {
        let tables = lock(&self.tables).ok()?;
        let value = tables.get(R::NAME)?.get(&id)?.clone();
        serde_json::from_value(value).ok()
    }

    /// How many times `op` ran against the entity named `entity`.
    pub fn calls(&self, entity: &str, op: Operation) -> usize {
        lock(&self.calls)
            .map(|c| {
                c.iter()
                    .filter(|((name, o), _)| *name == entity && *o == op)
                    .map(|(_, n)| *n)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Total repository calls against an entity, any operation.
    pub fn touches(&self, entity: &str) -> usize {
        lock(&self.calls)
            .map(|c| c.iter().filter(|((name, _), _)| *name == entity).map(|(_, n)| *n).sum())
            .unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        if let Ok(mut c) = lock(&self.calls) {
            c.clear();
        }
    }

    fn count(&self, entity: &'static str, op: Operation) {
        if let Ok(mut c) = lock(&self.calls) {
            *c.entry((entity, op)).or_default() += 1;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, ServiceError> {
        let snapshot = lock(&self.tables)?.clone();
        Ok(MemoryUnitOfWork {
            store: self.clone(),
            working: Mutex::new(snapshot),
            log: Mutex::new(Vec::new()),
        })
    }
}

impl MemoryUnitOfWork {
    fn put<R: Record>(&self, record: &R) -> Result<(), ServiceError> {
        let value = serde_json::to_value(record)?;
        lock(&self.working)?
            .entry(R::NAME)
            .or_default()
            .insert(record.id(), value.clone());
        lock(&self.log)?.push(Write::Put(R::NAME, record.id(), value));
        Ok(())
    }

    fn contains<R: Record>(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(lock(&self.working)?
            .get(R::NAME)
            .is_some_and(|t| t.contains_key(&id)))
    }
}

#[async_trait]
impl Repository for MemoryUnitOfWork {
    async fn find_by_id<R: Record>(&self, id: Uuid) -> Result<Option<R>, ServiceError> {
        self.store.count(R::NAME, Operation::FindById);
        let value = lock(&self.working)?
            .get(R::NAME)
            .and_then(|t| t.get(&id))
            .cloned();
        match value {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn find<R: Record>(&self, query: Query<R>) -> Result<Vec<R>, ServiceError> {
        self.store.count(R::NAME, Operation::Find);
        let values: Vec<Json> = lock(&self.working)?
            .get(R::NAME)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default();
        let mut rows = Vec::new();
        for value in values {
            let record: R = serde_json::from_value(value)?;
            if query.matches(&record) {
                rows.push(record);
            }
        }
        Ok(query.arrange(rows))
    }

    async fn insert<R: Record>(&self, record: R) -> Result<R, ServiceError> {
        self.store.count(R::NAME, Operation::Insert);
        if self.contains::<R>(record.id())? {
            return Err(ServiceError::Conflict(format!("{} {} already exists", R::NAME, record.id())));
        }
        self.put(&record)?;
        Ok(record)
    }

    async fn update<R: Record>(&self, record: R) -> Result<R, ServiceError> {
        self.store.count(R::NAME, Operation::Update);
        if !self.contains::<R>(record.id())? {
            return Err(ServiceError::not_found(R::NAME, record.id()));
        }
        self.put(&record)?;
        Ok(record)
    }

    async fn delete<R: Record>(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.store.count(R::NAME, Operation::Delete);
        let removed = lock(&self.working)?
            .get_mut(R::NAME)
            .and_then(|t| t.remove(&id))
            .is_some();
        if removed {
            lock(&self.log)?.push(Write::Remove(R::NAME, id));
        }
        Ok(removed)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> Result<(), ServiceError> {
        let log = self.log.into_inner().map_err(|_| ServiceError::Db("memory store lock poisoned".into()))?;
        let writes = log.len();
        let mut tables = lock(&self.store.tables)?;
        for write in log {
            match write {
                Write::Put(name, id, value) => {
                    tables.entry(name).or_default().insert(id, value);
                }
                Write::Remove(name, id) => {
                    if let Some(t) = tables.get_mut(name) {
                        t.remove(&id);
                    }
                }
            }
        }
        debug!(writes, "memory unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), ServiceError> {
        debug!("memory unit of work rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Predicate;
    use chrono::Utc;
    use models::customer;

    fn customer(name: &str) -> customer::Model {
        let now = Utc::now().into();
        customer::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn commit_publishes_and_rollback_discards() -> Result<(), ServiceError> {
        let store = MemoryStore::new();

        let uow = store.begin().await?;
        let kept = uow.insert(customer("Kept")).await?;
        uow.commit().await?;

        let uow = store.begin().await?;
        uow.insert(customer("Dropped")).await?;
        assert_eq!(uow.find(Query::<customer::Model>::new()).await?.len(), 2);
        uow.rollback().await?;

        assert_eq!(store.len::<customer::Model>(), 1);
        assert_eq!(store.get::<customer::Model>(kept.id).map(|c| c.name), Some("Kept".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_to_other_units() -> Result<(), ServiceError> {
        let store = MemoryStore::new();
        let writer = store.begin().await?;
        let c = writer.insert(customer("Ghost")).await?;

        let reader = store.begin().await?;
        assert!(reader.find_by_id::<customer::Model>(c.id).await?.is_none());
        drop(writer);
        assert_eq!(store.len::<customer::Model>(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn delete_and_update_report_missing_rows() -> Result<(), ServiceError> {
        let store = MemoryStore::new();
        let uow = store.begin().await?;
        assert!(!uow.delete::<customer::Model>(Uuid::new_v4()).await?);
        let err = uow.update(customer("Nobody")).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("customer"));
        assert_eq!(store.calls("customer", Operation::Delete), 1);
        assert_eq!(store.calls("customer", Operation::Update), 1);
        Ok(())
    }

    #[tokio::test]
    async fn find_applies_predicates() -> Result<(), ServiceError> {
        let store = MemoryStore::new();
        store.seed(&customer("Alpha Traders"))?;
        store.seed(&customer("Beta"))?;
        let uow = store.begin().await?;
        let hits = uow
            .find(Query::new().filter(Predicate::<customer::Model>::contains(customer::Column::Name, "TRADERS")))
            .await?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Alpha Traders");
        Ok(())
    }
}
