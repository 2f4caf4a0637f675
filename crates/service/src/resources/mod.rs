//! Concrete resources: request/response shapes, reference rules and finders
//! for each entity of the ERP domain.

pub mod account;
pub mod customer;
pub mod delivery;
pub mod inventory;
pub mod ledger;
pub mod procurement;
pub mod production;
pub mod sales;
pub mod shipping;
pub mod workforce;

use models::{ColumnOf, Record};
use sea_orm::Value;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::query::{Predicate, Query};
use crate::repository::Repository;

pub use account::{AccountService, Accounts};
pub use customer::{CustomerService, Customers};
pub use delivery::{DeliveryItemService, DeliveryItems, InboundDeliveries, InboundDeliveryService};
pub use inventory::{InventoryItemService, InventoryItems, MaterialTransactionService, MaterialTransactions};
pub use ledger::{JournalEntries, JournalEntryService};
pub use procurement::{ItemSales, ItemSalesService, ProcurementService, Procurements, SupplyItemService, SupplyItems};
pub use production::{ProductionOrderService, ProductionOrders, QualityCheckService, QualityChecks};
pub use sales::{InvoiceService, Invoices, SalesOrderService, SalesOrders};
pub use shipping::{ShipmentService, Shipments, TrackingInfoService, TrackingInfos};
pub use workforce::{EmployeeService, Employees, ShiftService, Shifts};

/// Conflict when another row already holds `value` in a unique column.
pub(crate) async fn ensure_unique<R: Record, U: Repository>(
    repo: &U,
    col: ColumnOf<R>,
    value: Value,
    label: &str,
    current: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken = repo
        .find(Query::<R>::new().filter(Predicate::eq(col, value)))
        .await?
        .iter()
        .any(|row| Some(row.id()) != current);
    if taken {
        return Err(ServiceError::Conflict(format!("{} with this {label} already exists", R::NAME)));
    }
    Ok(())
}

/// Resolve every id of a link list, failing with the child entity's not-found.
pub(crate) async fn require_all<R: Record, U: Repository>(repo: &U, ids: &[Uuid]) -> Result<Vec<R>, ServiceError> {
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        rows.push(crate::repository::require::<R, U>(repo, *id).await?);
    }
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::audit::Actor;
    use crate::store::MemoryStore;

    pub fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    pub fn actor() -> Actor {
        Actor::user(uuid::Uuid::new_v4(), "tester@example.com")
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }
}
