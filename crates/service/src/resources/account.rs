use chrono::NaiveDate;
use models::account::{self, Column};
use models::journal_entry;
use models::enums::AccountType;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{Repository, Store};
use crate::validation::{currency_code, non_negative_decimal, not_blank, positive_bound, positive_range};

use super::ensure_unique;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccountRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub account_number: String,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub account_type: AccountType,
    #[validate(custom(function = "non_negative_decimal"))]
    pub balance: Decimal,
    #[validate(custom(function = "currency_code"))]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Accounts;

#[async_trait::async_trait]
impl Resource for Accounts {
    type Record = account::Model;
    type Request = AccountRequest;
    type Response = AccountResponse;

    const PATH: &'static str = "accounts";

    fn body_id(request: &AccountRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &AccountRequest) -> account::Model {
        account::Model {
            id,
            account_number: r.account_number.trim().to_string(),
            name: r.name.trim().to_string(),
            account_type: r.account_type,
            balance: r.balance,
            currency: r.currency.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: account::Model, now: DateTimeWithTimeZone, r: &AccountRequest) -> account::Model {
        account::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: account::Model) -> AccountResponse {
        AccountResponse {
            id: m.id,
            account_number: m.account_number,
            name: m.name,
            account_type: m.account_type,
            balance: m.balance,
            currency: m.currency,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &AccountRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<account::Model, U>(repo, Column::AccountNumber, r.account_number.trim().into(), "account number", current)
            .await
    }

    async fn before_delete<U: Repository>(repo: &U, record: &account::Model) -> Result<(), ServiceError> {
        let posted = repo
            .find_first(Query::<journal_entry::Model>::new().filter(Predicate::eq(journal_entry::Column::AccountId, record.id)))
            .await?;
        if posted.is_some() {
            return Err(ServiceError::Conflict(format!("account {} still has journal entries", record.account_number)));
        }
        Ok(())
    }
}

pub type AccountService<S> = CrudService<Accounts, S>;

impl<S: Store> CrudService<Accounts, S> {
    pub async fn find_by_account_number(&self, number: &str) -> Result<AccountResponse, ServiceError> {
        self.find_single(Query::new().filter(Predicate::eq(Column::AccountNumber, number.to_string())), number)
            .await
    }

    pub async fn find_by_name(&self, fragment: &str) -> Result<Vec<AccountResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(Column::Name, fragment))).await
    }

    pub async fn find_by_account_type(&self, account_type: AccountType) -> Result<Vec<AccountResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(Column::AccountType, account_type))).await
    }

    pub async fn find_by_balance_greater_than(&self, min: Decimal) -> Result<Vec<AccountResponse>, ServiceError> {
        let min = positive_bound("balance", min)?;
        self.find_by(
            Query::new()
                .filter(Predicate::gt(Column::Balance, min))
                .order_by(Column::Balance, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_balance_less_than(&self, max: Decimal) -> Result<Vec<AccountResponse>, ServiceError> {
        let max = positive_bound("balance", max)?;
        self.find_by(Query::new().filter(Predicate::lt(Column::Balance, max))).await
    }

    pub async fn find_by_balance_between(&self, low: Decimal, high: Decimal) -> Result<Vec<AccountResponse>, ServiceError> {
        let (low, high) = positive_range("balance", low, high)?;
        self.find_by(Query::new().filter(Predicate::between(Column::Balance, low, high))).await
    }

    pub async fn find_by_currency(&self, currency: &str) -> Result<Vec<AccountResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(Column::Currency, currency.to_uppercase()))).await
    }

    pub async fn find_opened_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<AccountResponse>, ServiceError> {
        let (from, to) = crate::validation::ordered_range("created_at", from, to)?;
        let start: DateTimeWithTimeZone = from.and_time(chrono::NaiveTime::MIN).and_utc().into();
        let end: DateTimeWithTimeZone = to.and_time(chrono::NaiveTime::MIN).and_utc().into();
        self.find_by(
            Query::new()
                .filter(Predicate::gte(Column::CreatedAt, start))
                .filter(Predicate::lt(Column::CreatedAt, end + chrono::Duration::days(1))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::fixtures::{actor, store};
    use crate::store::memory::Operation;

    fn request(number: &str, balance: i64) -> AccountRequest {
        AccountRequest {
            id: None,
            account_number: number.into(),
            name: format!("Account {number}"),
            account_type: AccountType::Asset,
            balance: Decimal::new(balance, 0),
            currency: "EUR".into(),
        }
    }

    #[tokio::test]
    async fn negative_balance_is_rejected() {
        let store = store();
        let svc = AccountService::new(store.clone());
        let err = svc.create(&actor(), request("1000", -5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.touches("account"), 0);
    }

    #[tokio::test]
    async fn create_echoes_request_fields_with_new_id() -> Result<(), ServiceError> {
        let store = store();
        let svc = AccountService::new(store.clone());
        let req = request("1000", 100);
        let created = svc.create(&actor(), req.clone()).await?;
        assert_eq!(created.balance, Decimal::new(100, 0));
        assert_eq!(created.account_number, req.account_number);
        assert_eq!(created.name, req.name);
        assert_eq!(created.currency, req.currency);
        assert_ne!(created.id, Uuid::nil());
        assert_eq!(svc.find_one(created.id).await?, created);
        assert_eq!(store.len::<models::event_log::Model>(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_with_mismatched_id_touches_nothing() -> Result<(), ServiceError> {
        let store = store();
        let svc = AccountService::new(store.clone());
        let created = svc.create(&actor(), request("1000", 10)).await?;
        store.reset_calls();

        let mut req = request("1000", 20);
        req.id = Some(Uuid::new_v4());
        let err = svc.update(&actor(), created.id, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.touches("account"), 0);
        assert_eq!(store.touches("event log"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn update_overwrites_and_keeps_creation_time() -> Result<(), ServiceError> {
        let svc = AccountService::new(store());
        let created = svc.create(&actor(), request("1000", 10)).await?;
        let mut req = request("1000", 250);
        req.id = Some(created.id);
        req.name = "Renamed".into();
        let updated = svc.update(&actor(), created.id, req).await?;
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.balance, Decimal::new(250, 0));
        assert_eq!(updated.created_at, created.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn delete_of_missing_account_never_deletes() {
        let store = store();
        let svc = AccountService::new(store.clone());
        let err = svc.delete(&actor(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("account"));
        assert_eq!(store.calls("account", Operation::Delete), 0);
    }

    #[tokio::test]
    async fn account_with_entries_cannot_be_deleted() -> Result<(), ServiceError> {
        let store = store();
        let svc = AccountService::new(store.clone());
        let created = svc.create(&actor(), request("1200", 10)).await?;
        let entry = journal_entry::Model {
            id: Uuid::new_v4(),
            account_id: created.id,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap_or_default(),
            description: "opening".into(),
            debit: Decimal::new(10, 0),
            credit: Decimal::ZERO,
            reference: None,
            created_at: created.created_at,
            updated_at: created.created_at,
        };
        store.seed(&entry)?;

        let err = svc.delete(&actor(), created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.calls("account", Operation::Delete), 0);
        assert!(svc.exists(created.id).await?);

        store.reset_calls();
        store.seed(&journal_entry::Model { account_id: Uuid::new_v4(), ..entry })?;
        svc.delete(&actor(), created.id).await?;
        assert!(!svc.exists(created.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_account_number_conflicts() -> Result<(), ServiceError> {
        let svc = AccountService::new(store());
        svc.create(&actor(), request("1000", 1)).await?;
        let err = svc.create(&actor(), request("1000", 2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn balance_filters_validate_bounds_and_match_exactly() -> Result<(), ServiceError> {
        let store = store();
        let svc = AccountService::new(store.clone());
        for (n, b) in [("1", 50), ("2", 150), ("3", 300)] {
            svc.create(&actor(), request(n, b)).await?;
        }
        store.reset_calls();
        assert!(matches!(
            svc.find_by_balance_greater_than(Decimal::ZERO).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(svc.find_by_balance_between(Decimal::new(10, 0), Decimal::new(-1, 0)).await.is_err());
        assert_eq!(store.touches("account"), 0);

        let above: Vec<_> = svc
            .find_by_balance_greater_than(Decimal::new(100, 0))
            .await?
            .into_iter()
            .map(|a| a.account_number)
            .collect();
        assert_eq!(above, vec!["2".to_string(), "3".to_string()]);
        assert_eq!(svc.find_by_balance_between(Decimal::new(100, 0), Decimal::new(300, 0)).await?.len(), 2);
        assert!(svc.find_by_balance_less_than(Decimal::new(10, 0)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn lookup_by_number_is_singular() -> Result<(), ServiceError> {
        let svc = AccountService::new(store());
        svc.create(&actor(), request("4711", 1)).await?;
        assert_eq!(svc.find_by_account_number("4711").await?.account_number, "4711");
        let err = svc.find_by_account_number("0000").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("account"));
        assert_eq!(svc.find_by_name("account 47").await?.len(), 1);
        Ok(())
    }
}
