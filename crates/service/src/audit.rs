//! Audit trail: every write records who did what to which row, in the same
//! unit of work as the write itself.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use common::pagination::Pagination;
use models::enums::AuditAction;
use models::event_log::{self, Column};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{finish, Repository, Store};
use crate::validation::ordered_range;

/// Caller identity attached to every service operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub subject: String,
    pub user_id: Option<Uuid>,
}

impl Actor {
    pub fn system() -> Self {
        Self { subject: "system".into(), user_id: None }
    }

    pub fn user(user_id: Uuid, email: impl Into<String>) -> Self {
        Self { subject: email.into(), user_id: Some(user_id) }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)
    }
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

pub async fn record_event<U: Repository>(
    repo: &U,
    actor: &Actor,
    action: AuditAction,
    entity_name: &str,
    entity_id: Option<Uuid>,
    details: Option<String>,
) -> Result<(), ServiceError> {
    let row = event_log::Model {
        id: Uuid::new_v4(),
        actor: actor.subject.clone(),
        action,
        entity_name: entity_name.to_string(),
        entity_id,
        details,
        occurred_at: now(),
    };
    repo.insert(row).await?;
    Ok(())
}

/// Read side of the event log. Entries are never edited through the service layer.
pub struct AuditService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for AuditService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: Store> AuditService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn run(&self, query: Query<event_log::Model>) -> Result<Vec<event_log::Model>, ServiceError> {
        let uow = self.store.begin().await?;
        let outcome = uow.find(query.order_by(Column::OccurredAt, Direction::Desc)).await;
        finish(uow, outcome).await
    }

    pub async fn find_all(&self, page: Option<Pagination>) -> Result<Vec<event_log::Model>, ServiceError> {
        let mut query = Query::new();
        if let Some(page) = page {
            query = query.paginate(page);
        }
        self.run(query).await
    }

    #[instrument(skip(self))]
    pub async fn find_for_entity(&self, entity_name: &str, entity_id: Uuid) -> Result<Vec<event_log::Model>, ServiceError> {
        self.run(
            Query::new()
                .filter(Predicate::eq(Column::EntityName, entity_name.to_string()))
                .filter(Predicate::eq(Column::EntityId, entity_id)),
        )
        .await
    }

    pub async fn find_by_actor(&self, actor: &str) -> Result<Vec<event_log::Model>, ServiceError> {
        self.run(Query::new().filter(Predicate::eq(Column::Actor, actor.to_string()))).await
    }

    pub async fn find_by_action(&self, action: AuditAction) -> Result<Vec<event_log::Model>, ServiceError> {
        self.run(Query::new().filter(Predicate::eq(Column::Action, action))).await
    }

    pub async fn find_between(
        &self,
        from: DateTimeWithTimeZone,
        to: DateTimeWithTimeZone,
    ) -> Result<Vec<event_log::Model>, ServiceError> {
        let (from, to) = ordered_range("occurred_at", from, to)?;
        self.run(Query::new().filter(Predicate::between(Column::OccurredAt, from, to))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::repository::UnitOfWork;

    #[tokio::test]
    async fn events_are_filtered_by_entity_and_actor() -> Result<(), ServiceError> {
        let store = Arc::new(MemoryStore::new());
        let target = Uuid::new_v4();
        let alice = Actor::user(Uuid::new_v4(), "alice@example.com");

        let uow = store.begin().await?;
        record_event(&uow, &alice, AuditAction::Create, "customer", Some(target), None).await?;
        record_event(&uow, &Actor::system(), AuditAction::Update, "customer", Some(target), None).await?;
        record_event(&uow, &alice, AuditAction::Create, "account", Some(Uuid::new_v4()), None).await?;
        uow.commit().await?;

        let audit = AuditService::new(store);
        assert_eq!(audit.find_for_entity("customer", target).await?.len(), 2);
        assert_eq!(audit.find_by_actor("alice@example.com").await?.len(), 2);
        assert_eq!(audit.find_by_action(AuditAction::Update).await?.len(), 1);
        assert!(audit.find_by_actor("nobody").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let audit = AuditService::new(Arc::new(MemoryStore::new()));
        let later = now();
        let earlier = later - chrono::Duration::hours(1);
        let err = audit.find_between(later, earlier).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
