use chrono::NaiveDate;
use models::enums::TransactionType;
use models::{delivery_item, inventory_item, item_sales, material_transaction, production_order};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{require, Repository, Store};
use crate::validation::{not_blank, ordered_range, positive_count, positive_decimal, positive_range};

use super::ensure_unique;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InventoryItemRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub sku: String,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(custom(function = "positive_decimal"))]
    pub unit_price: Decimal,
    #[validate(range(min = 0))]
    pub reorder_level: i32,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub reorder_level: i32,
    pub location: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct InventoryItems;

#[async_trait::async_trait]
impl Resource for InventoryItems {
    type Record = inventory_item::Model;
    type Request = InventoryItemRequest;
    type Response = InventoryItemResponse;

    const PATH: &'static str = "inventory-items";

    fn body_id(request: &InventoryItemRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &InventoryItemRequest) -> inventory_item::Model {
        inventory_item::Model {
            id,
            sku: r.sku.trim().to_uppercase(),
            name: r.name.trim().to_string(),
            quantity: r.quantity,
            unit_price: r.unit_price,
            reorder_level: r.reorder_level,
            location: r.location.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: inventory_item::Model, now: DateTimeWithTimeZone, r: &InventoryItemRequest) -> inventory_item::Model {
        inventory_item::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: inventory_item::Model) -> InventoryItemResponse {
        InventoryItemResponse {
            id: m.id,
            sku: m.sku,
            name: m.name,
            quantity: m.quantity,
            unit_price: m.unit_price,
            reorder_level: m.reorder_level,
            location: m.location,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &InventoryItemRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<inventory_item::Model, U>(
            repo,
            inventory_item::Column::Sku,
            r.sku.trim().to_uppercase().into(),
            "sku",
            current,
        )
        .await
    }

    /// Refuses while deliveries or production orders point at the item; its
    /// material transactions and sales figures go with it.
    async fn before_delete<U: Repository>(repo: &U, record: &inventory_item::Model) -> Result<(), ServiceError> {
        let delivered = repo
            .find_first(Query::<delivery_item::Model>::new().filter(Predicate::eq(delivery_item::Column::InventoryItemId, record.id)))
            .await?;
        if delivered.is_some() {
            return Err(ServiceError::Conflict(format!("inventory item {} still has delivery items", record.sku)));
        }
        let produced = repo
            .find_first(
                Query::<production_order::Model>::new().filter(Predicate::eq(production_order::Column::ProductId, record.id)),
            )
            .await?;
        if produced.is_some() {
            return Err(ServiceError::Conflict(format!("inventory item {} still has production orders", record.sku)));
        }

        let movements = repo
            .find(Query::<material_transaction::Model>::new().filter(Predicate::eq(material_transaction::Column::InventoryItemId, record.id)))
            .await?;
        for movement in movements {
            repo.delete::<material_transaction::Model>(movement.id).await?;
        }
        let sales = repo
            .find(Query::<item_sales::Model>::new().filter(Predicate::eq(item_sales::Column::InventoryItemId, record.id)))
            .await?;
        for sale in sales {
            repo.delete::<item_sales::Model>(sale.id).await?;
        }
        Ok(())
    }
}

pub type InventoryItemService<S> = CrudService<InventoryItems, S>;

impl<S: Store> CrudService<InventoryItems, S> {
    pub async fn find_by_sku(&self, sku: &str) -> Result<InventoryItemResponse, ServiceError> {
        let sku = sku.trim().to_uppercase();
        self.find_single(Query::new().filter(Predicate::eq(inventory_item::Column::Sku, sku.clone())), sku)
            .await
    }

    pub async fn find_by_name(&self, fragment: &str) -> Result<Vec<InventoryItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(inventory_item::Column::Name, fragment))).await
    }

    pub async fn find_by_location(&self, location: &str) -> Result<Vec<InventoryItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(inventory_item::Column::Location, location.to_string())))
            .await
    }

    pub async fn find_by_quantity_less_than(&self, max: i32) -> Result<Vec<InventoryItemResponse>, ServiceError> {
        let max = positive_count("quantity", max)?;
        self.find_by(Query::new().filter(Predicate::lt(inventory_item::Column::Quantity, max))).await
    }

    pub async fn find_by_unit_price_between(&self, low: Decimal, high: Decimal) -> Result<Vec<InventoryItemResponse>, ServiceError> {
        let (low, high) = positive_range("unit_price", low, high)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(inventory_item::Column::UnitPrice, low, high))
                .order_by(inventory_item::Column::UnitPrice, Direction::Asc),
        )
        .await
    }

    /// Items at or under their reorder level.
    pub async fn find_needing_reorder(&self) -> Result<Vec<InventoryItemResponse>, ServiceError> {
        let all = self.find_all(None).await?;
        Ok(all.into_iter().filter(|i| i.quantity <= i.reorder_level).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MaterialTransactionRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub inventory_item_id: Uuid,
    pub transaction_type: TransactionType,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTransactionResponse {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub transaction_date: NaiveDate,
    pub reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct MaterialTransactions;

#[async_trait::async_trait]
impl Resource for MaterialTransactions {
    type Record = material_transaction::Model;
    type Request = MaterialTransactionRequest;
    type Response = MaterialTransactionResponse;

    const PATH: &'static str = "material-transactions";

    fn body_id(request: &MaterialTransactionRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &MaterialTransactionRequest) -> material_transaction::Model {
        material_transaction::Model {
            id,
            inventory_item_id: r.inventory_item_id,
            transaction_type: r.transaction_type,
            quantity: r.quantity,
            transaction_date: r.transaction_date,
            reference: r.reference.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(
        existing: material_transaction::Model,
        now: DateTimeWithTimeZone,
        r: &MaterialTransactionRequest,
    ) -> material_transaction::Model {
        material_transaction::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: material_transaction::Model) -> MaterialTransactionResponse {
        MaterialTransactionResponse {
            id: m.id,
            inventory_item_id: m.inventory_item_id,
            transaction_type: m.transaction_type,
            quantity: m.quantity,
            transaction_date: m.transaction_date,
            reference: m.reference,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &MaterialTransactionRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<inventory_item::Model, U>(repo, r.inventory_item_id).await?;
        Ok(())
    }
}

pub type MaterialTransactionService<S> = CrudService<MaterialTransactions, S>;

impl<S: Store> CrudService<MaterialTransactions, S> {
    pub async fn find_by_inventory_item(&self, item_id: Uuid) -> Result<Vec<MaterialTransactionResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(material_transaction::Column::InventoryItemId, item_id))
                .order_by(material_transaction::Column::TransactionDate, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_transaction_type(&self, kind: TransactionType) -> Result<Vec<MaterialTransactionResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(material_transaction::Column::TransactionType, kind))).await
    }

    pub async fn find_by_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<MaterialTransactionResponse>, ServiceError> {
        let (from, to) = ordered_range("transaction_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(material_transaction::Column::TransactionDate, from, to)))
            .await
    }

    pub async fn find_by_quantity_greater_than(&self, min: i32) -> Result<Vec<MaterialTransactionResponse>, ServiceError> {
        let min = positive_count("quantity", min)?;
        self.find_by(Query::new().filter(Predicate::gt(material_transaction::Column::Quantity, min))).await
    }

    /// Transactions of every item whose SKU contains `fragment`.
    pub async fn find_by_item_sku(&self, fragment: &str) -> Result<Vec<MaterialTransactionResponse>, ServiceError> {
        self.find_related(
            Query::<inventory_item::Model>::new().filter(Predicate::contains(inventory_item::Column::Sku, fragment)),
            material_transaction::Column::InventoryItemId,
        )
        .await
    }
}
