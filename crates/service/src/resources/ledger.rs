use std::borrow::Cow;

use chrono::NaiveDate;
use models::{account, journal_entry};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{require, Repository, Store};
use crate::validation::{non_negative_decimal, not_blank, ordered_range, positive_bound};

/// Exactly one side of an entry carries the amount.
fn one_sided(r: &JournalEntryRequest) -> Result<(), ValidationError> {
    let debit = r.debit > Decimal::ZERO;
    let credit = r.credit > Decimal::ZERO;
    if debit == credit {
        return Err(ValidationError::new("one_sided")
            .with_message(Cow::Borrowed("exactly one of debit and credit must be greater than zero")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "one_sided"))]
pub struct JournalEntryRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub account_id: Uuid,
    pub entry_date: NaiveDate,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(custom(function = "non_negative_decimal"))]
    pub debit: Decimal,
    #[validate(custom(function = "non_negative_decimal"))]
    pub credit: Decimal,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct JournalEntries;

#[async_trait::async_trait]
impl Resource for JournalEntries {
    type Record = journal_entry::Model;
    type Request = JournalEntryRequest;
    type Response = JournalEntryResponse;

    const PATH: &'static str = "journal-entries";

    fn body_id(request: &JournalEntryRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &JournalEntryRequest) -> journal_entry::Model {
        journal_entry::Model {
            id,
            account_id: r.account_id,
            entry_date: r.entry_date,
            description: r.description.trim().to_string(),
            debit: r.debit,
            credit: r.credit,
            reference: r.reference.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: journal_entry::Model, now: DateTimeWithTimeZone, r: &JournalEntryRequest) -> journal_entry::Model {
        journal_entry::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: journal_entry::Model) -> JournalEntryResponse {
        JournalEntryResponse {
            id: m.id,
            account_id: m.account_id,
            entry_date: m.entry_date,
            description: m.description,
            debit: m.debit,
            credit: m.credit,
            reference: m.reference,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &JournalEntryRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<account::Model, U>(repo, r.account_id).await?;
        Ok(())
    }
}

pub type JournalEntryService<S> = CrudService<JournalEntries, S>;

impl<S: Store> CrudService<JournalEntries, S> {
    pub async fn find_by_account(&self, account_id: Uuid) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(journal_entry::Column::AccountId, account_id))
                .order_by(journal_entry::Column::EntryDate, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_account_number(&self, number: &str) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        self.find_related(
            Query::<account::Model>::new().filter(Predicate::eq(account::Column::AccountNumber, number.to_string())),
            journal_entry::Column::AccountId,
        )
        .await
    }

    pub async fn find_by_entry_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        let (from, to) = ordered_range("entry_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(journal_entry::Column::EntryDate, from, to))).await
    }

    pub async fn find_by_debit_greater_than(&self, min: Decimal) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        let min = positive_bound("debit", min)?;
        self.find_by(Query::new().filter(Predicate::gt(journal_entry::Column::Debit, min))).await
    }

    pub async fn find_by_credit_greater_than(&self, min: Decimal) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        let min = positive_bound("credit", min)?;
        self.find_by(Query::new().filter(Predicate::gt(journal_entry::Column::Credit, min))).await
    }

    pub async fn find_by_description(&self, fragment: &str) -> Result<Vec<JournalEntryResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(journal_entry::Column::Description, fragment))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::account::{AccountRequest, AccountService};
    use crate::resources::fixtures::{actor, date, store};
    use models::enums::AccountType;

    fn entry(account_id: Uuid, debit: i64, credit: i64) -> JournalEntryRequest {
        JournalEntryRequest {
            id: None,
            account_id,
            entry_date: date(2024, 6, 30),
            description: "Quarter close".into(),
            debit: Decimal::new(debit, 0),
            credit: Decimal::new(credit, 0),
            reference: None,
        }
    }

    #[tokio::test]
    async fn entries_must_be_one_sided() {
        let svc = JournalEntryService::new(store());
        for (d, c) in [(0, 0), (10, 10)] {
            let err = svc.create(&actor(), entry(Uuid::new_v4(), d, c)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn entry_for_unknown_account_is_not_found() {
        let svc = JournalEntryService::new(store());
        let err = svc.create(&actor(), entry(Uuid::new_v4(), 10, 0)).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("account"));
    }

    #[tokio::test]
    async fn entries_are_found_through_their_account() -> Result<(), ServiceError> {
        let store = store();
        let accounts = AccountService::new(store.clone());
        let journal = JournalEntryService::new(store);
        let cash = accounts
            .create(
                &actor(),
                AccountRequest {
                    id: None,
                    account_number: "1010".into(),
                    name: "Cash".into(),
                    account_type: AccountType::Asset,
                    balance: Decimal::ZERO,
                    currency: "USD".into(),
                },
            )
            .await?;
        journal.create(&actor(), entry(cash.id, 100, 0)).await?;
        journal.create(&actor(), entry(cash.id, 0, 40)).await?;

        assert_eq!(journal.find_by_account(cash.id).await?.len(), 2);
        assert_eq!(journal.find_by_account_number("1010").await?.len(), 2);
        assert!(journal.find_by_account_number("9999").await?.is_empty());
        assert_eq!(journal.find_by_debit_greater_than(Decimal::new(50, 0)).await?.len(), 1);
        assert_eq!(journal.find_by_credit_greater_than(Decimal::ONE).await?.len(), 1);
        Ok(())
    }
}
