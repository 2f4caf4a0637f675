//! Procurements and the supply items and item sales they account for.
//!
//! Children own the link (`procurement_id`). A child belongs to at most one
//! procurement; procurement writes re-sync both child sets from the request.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use models::enums::ProcurementStatus;
use models::{inventory_item, item_sales, procurement, supply_item, ColumnOf, Record};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::audit::now;
use crate::crud::{observe, CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{finish, require, Repository, Store};
use crate::validation::{not_blank, ordered_range, positive_bound, positive_count, positive_decimal, positive_range};

use super::{ensure_unique, require_all};

/// Child side of a procurement link.
trait Linked: Record {
    fn owner(&self) -> Option<Uuid>;
    fn with_owner(self, owner: Option<Uuid>, now: DateTimeWithTimeZone) -> Self;
    fn owner_column() -> ColumnOf<Self>;
}

impl Linked for supply_item::Model {
    fn owner(&self) -> Option<Uuid> {
        self.procurement_id
    }

    fn with_owner(self, procurement_id: Option<Uuid>, updated_at: DateTimeWithTimeZone) -> Self {
        Self { procurement_id, updated_at, ..self }
    }

    fn owner_column() -> supply_item::Column {
        supply_item::Column::ProcurementId
    }
}

impl Linked for item_sales::Model {
    fn owner(&self) -> Option<Uuid> {
        self.procurement_id
    }

    fn with_owner(self, procurement_id: Option<Uuid>, updated_at: DateTimeWithTimeZone) -> Self {
        Self { procurement_id, updated_at, ..self }
    }

    fn owner_column() -> item_sales::Column {
        item_sales::Column::ProcurementId
    }
}

async fn children<C: Linked, U: Repository>(repo: &U, owner: Uuid) -> Result<Vec<C>, ServiceError> {
    repo.find(Query::new().filter(Predicate::eq(C::owner_column(), owner))).await
}

/// Every id exists and is free or already ours.
async fn check_free<C: Linked, U: Repository>(repo: &U, ids: &[Uuid], current: Option<Uuid>) -> Result<(), ServiceError> {
    for child in require_all::<C, U>(repo, ids).await? {
        if child.owner().is_some() && child.owner() != current {
            return Err(ServiceError::Conflict(format!(
                "{} {} already belongs to another procurement",
                C::NAME,
                child.id()
            )));
        }
    }
    Ok(())
}

async fn sync<C: Linked, U: Repository>(repo: &U, owner: Uuid, wanted: &[Uuid]) -> Result<(), ServiceError> {
    let wanted: BTreeSet<Uuid> = wanted.iter().copied().collect();
    let mut present = BTreeSet::new();
    for child in children::<C, U>(repo, owner).await? {
        if wanted.contains(&child.id()) {
            present.insert(child.id());
        } else {
            repo.update(child.with_owner(None, now())).await?;
        }
    }
    for id in wanted.difference(&present) {
        let child = require::<C, U>(repo, *id).await?;
        repo.update(child.with_owner(Some(owner), now())).await?;
    }
    Ok(())
}

async fn release<C: Linked, U: Repository>(repo: &U, owner: Uuid) -> Result<(), ServiceError> {
    for child in children::<C, U>(repo, owner).await? {
        repo.update(child.with_owner(None, now())).await?;
    }
    Ok(())
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcurementRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub procurement_number: String,
    #[validate(custom(function = "not_blank"))]
    pub supplier_name: String,
    pub procurement_date: NaiveDate,
    #[validate(custom(function = "positive_decimal"))]
    pub total_cost: Decimal,
    pub status: ProcurementStatus,
    #[serde(default)]
    pub supply_item_ids: Vec<Uuid>,
    #[serde(default)]
    pub item_sales_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementResponse {
    pub id: Uuid,
    pub procurement_number: String,
    pub supplier_name: String,
    pub procurement_date: NaiveDate,
    pub total_cost: Decimal,
    pub status: ProcurementStatus,
    pub supply_item_ids: Vec<Uuid>,
    pub item_sales_ids: Vec<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Procurements;

#[async_trait::async_trait]
impl Resource for Procurements {
    type Record = procurement::Model;
    type Request = ProcurementRequest;
    type Response = ProcurementResponse;

    const PATH: &'static str = "procurements";

    fn body_id(request: &ProcurementRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &ProcurementRequest) -> procurement::Model {
        procurement::Model {
            id,
            procurement_number: r.procurement_number.trim().to_string(),
            supplier_name: r.supplier_name.trim().to_string(),
            procurement_date: r.procurement_date,
            total_cost: r.total_cost,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: procurement::Model, now: DateTimeWithTimeZone, r: &ProcurementRequest) -> procurement::Model {
        procurement::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: procurement::Model) -> ProcurementResponse {
        ProcurementResponse {
            id: m.id,
            procurement_number: m.procurement_number,
            supplier_name: m.supplier_name,
            procurement_date: m.procurement_date,
            total_cost: m.total_cost,
            status: m.status,
            supply_item_ids: Vec::new(),
            item_sales_ids: Vec::new(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &ProcurementRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<procurement::Model, U>(
            repo,
            procurement::Column::ProcurementNumber,
            r.procurement_number.trim().into(),
            "procurement number",
            current,
        )
        .await?;
        check_free::<supply_item::Model, U>(repo, &dedup(&r.supply_item_ids), current).await?;
        check_free::<item_sales::Model, U>(repo, &dedup(&r.item_sales_ids), current).await
    }

    async fn after_write<U: Repository>(repo: &U, record: &procurement::Model, r: &ProcurementRequest) -> Result<(), ServiceError> {
        sync::<supply_item::Model, U>(repo, record.id, &r.supply_item_ids).await?;
        sync::<item_sales::Model, U>(repo, record.id, &r.item_sales_ids).await
    }

    async fn before_delete<U: Repository>(repo: &U, record: &procurement::Model) -> Result<(), ServiceError> {
        release::<supply_item::Model, U>(repo, record.id).await?;
        release::<item_sales::Model, U>(repo, record.id).await
    }

    async fn enrich<U: Repository>(repo: &U, response: &mut ProcurementResponse) -> Result<(), ServiceError> {
        response.supply_item_ids = children::<supply_item::Model, U>(repo, response.id).await?.iter().map(|c| c.id).collect();
        response.item_sales_ids = children::<item_sales::Model, U>(repo, response.id).await?.iter().map(|c| c.id).collect();
        Ok(())
    }
}

pub type ProcurementService<S> = CrudService<Procurements, S>;

impl<S: Store> CrudService<Procurements, S> {
    pub async fn find_by_procurement_number(&self, number: &str) -> Result<ProcurementResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(procurement::Column::ProcurementNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_supplier(&self, fragment: &str) -> Result<Vec<ProcurementResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(procurement::Column::SupplierName, fragment))).await
    }

    pub async fn find_by_status(&self, status: ProcurementStatus) -> Result<Vec<ProcurementResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(procurement::Column::Status, status))).await
    }

    pub async fn find_by_total_cost_greater_than(&self, min: Decimal) -> Result<Vec<ProcurementResponse>, ServiceError> {
        let min = positive_bound("total_cost", min)?;
        self.find_by(Query::new().filter(Predicate::gt(procurement::Column::TotalCost, min))).await
    }

    pub async fn find_by_total_cost_between(&self, low: Decimal, high: Decimal) -> Result<Vec<ProcurementResponse>, ServiceError> {
        let (low, high) = positive_range("total_cost", low, high)?;
        self.find_by(Query::new().filter(Predicate::between(procurement::Column::TotalCost, low, high))).await
    }

    pub async fn find_by_procurement_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProcurementResponse>, ServiceError> {
        let (from, to) = ordered_range("procurement_date", from, to)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(procurement::Column::ProcurementDate, from, to))
                .order_by(procurement::Column::ProcurementDate, Direction::Asc),
        )
        .await
    }

    /// Supply items accounted to a procurement; the procurement must exist.
    pub async fn find_supply_items(&self, procurement_id: Uuid) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        let outcome = async {
            let uow = self.store().begin().await?;
            let outcome = async {
                require::<procurement::Model, _>(&uow, procurement_id).await?;
                let rows = children::<supply_item::Model, _>(&uow, procurement_id).await?;
                Ok(rows.into_iter().map(SupplyItems::to_response).collect())
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(procurement::Model::NAME, "find_supply_items", outcome)
    }

    pub async fn find_item_sales(&self, procurement_id: Uuid) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        let outcome = async {
            let uow = self.store().begin().await?;
            let outcome = async {
                require::<procurement::Model, _>(&uow, procurement_id).await?;
                let rows = children::<item_sales::Model, _>(&uow, procurement_id).await?;
                Ok(rows.into_iter().map(ItemSales::to_response).collect())
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(procurement::Model::NAME, "find_item_sales", outcome)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SupplyItemRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub supplier_name: String,
    #[validate(custom(function = "positive_decimal"))]
    pub unit_cost: Decimal,
    #[validate(range(min = 0))]
    pub quantity_available: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyItemResponse {
    pub id: Uuid,
    pub name: String,
    pub supplier_name: String,
    pub unit_cost: Decimal,
    pub quantity_available: i32,
    pub procurement_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct SupplyItems;

#[async_trait::async_trait]
impl Resource for SupplyItems {
    type Record = supply_item::Model;
    type Request = SupplyItemRequest;
    type Response = SupplyItemResponse;

    const PATH: &'static str = "supply-items";

    fn body_id(request: &SupplyItemRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &SupplyItemRequest) -> supply_item::Model {
        supply_item::Model {
            id,
            name: r.name.trim().to_string(),
            supplier_name: r.supplier_name.trim().to_string(),
            unit_cost: r.unit_cost,
            quantity_available: r.quantity_available,
            procurement_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: supply_item::Model, now: DateTimeWithTimeZone, r: &SupplyItemRequest) -> supply_item::Model {
        supply_item::Model {
            procurement_id: existing.procurement_id,
            created_at: existing.created_at,
            ..Self::create(existing.id, now, r)
        }
    }

    fn to_response(m: supply_item::Model) -> SupplyItemResponse {
        SupplyItemResponse {
            id: m.id,
            name: m.name,
            supplier_name: m.supplier_name,
            unit_cost: m.unit_cost,
            quantity_available: m.quantity_available,
            procurement_id: m.procurement_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub type SupplyItemService<S> = CrudService<SupplyItems, S>;

impl<S: Store> CrudService<SupplyItems, S> {
    pub async fn find_by_name(&self, fragment: &str) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(supply_item::Column::Name, fragment))).await
    }

    pub async fn find_by_supplier(&self, fragment: &str) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(supply_item::Column::SupplierName, fragment))).await
    }

    pub async fn find_by_unit_cost_between(&self, low: Decimal, high: Decimal) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        let (low, high) = positive_range("unit_cost", low, high)?;
        self.find_by(Query::new().filter(Predicate::between(supply_item::Column::UnitCost, low, high))).await
    }

    pub async fn find_by_quantity_available_greater_than(&self, min: i32) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        let min = positive_count("quantity_available", min)?;
        self.find_by(Query::new().filter(Predicate::gt(supply_item::Column::QuantityAvailable, min))).await
    }

    pub async fn find_unassigned(&self) -> Result<Vec<SupplyItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::is_null(supply_item::Column::ProcurementId))).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemSalesRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub inventory_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity_sold: i32,
    #[validate(custom(function = "positive_decimal"))]
    pub sale_price: Decimal,
    pub sale_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSalesResponse {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity_sold: i32,
    pub sale_price: Decimal,
    pub sale_date: NaiveDate,
    pub procurement_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct ItemSales;

#[async_trait::async_trait]
impl Resource for ItemSales {
    type Record = item_sales::Model;
    type Request = ItemSalesRequest;
    type Response = ItemSalesResponse;

    const PATH: &'static str = "item-sales";

    fn body_id(request: &ItemSalesRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &ItemSalesRequest) -> item_sales::Model {
        item_sales::Model {
            id,
            inventory_item_id: r.inventory_item_id,
            quantity_sold: r.quantity_sold,
            sale_price: r.sale_price,
            sale_date: r.sale_date,
            procurement_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: item_sales::Model, now: DateTimeWithTimeZone, r: &ItemSalesRequest) -> item_sales::Model {
        item_sales::Model {
            procurement_id: existing.procurement_id,
            created_at: existing.created_at,
            ..Self::create(existing.id, now, r)
        }
    }

    fn to_response(m: item_sales::Model) -> ItemSalesResponse {
        ItemSalesResponse {
            id: m.id,
            inventory_item_id: m.inventory_item_id,
            quantity_sold: m.quantity_sold,
            sale_price: m.sale_price,
            sale_date: m.sale_date,
            procurement_id: m.procurement_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &ItemSalesRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<inventory_item::Model, U>(repo, r.inventory_item_id).await?;
        Ok(())
    }
}

pub type ItemSalesService<S> = CrudService<ItemSales, S>;

impl<S: Store> CrudService<ItemSales, S> {
    pub async fn find_by_inventory_item(&self, item_id: Uuid) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(item_sales::Column::InventoryItemId, item_id))).await
    }

    pub async fn find_by_sale_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        let (from, to) = ordered_range("sale_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(item_sales::Column::SaleDate, from, to))).await
    }

    pub async fn find_by_sale_price_greater_than(&self, min: Decimal) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        let min = positive_bound("sale_price", min)?;
        self.find_by(Query::new().filter(Predicate::gt(item_sales::Column::SalePrice, min))).await
    }

    pub async fn find_by_quantity_sold_greater_than(&self, min: i32) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        let min = positive_count("quantity_sold", min)?;
        self.find_by(Query::new().filter(Predicate::gt(item_sales::Column::QuantitySold, min))).await
    }

    /// Sales of every item whose SKU contains `fragment`.
    pub async fn find_by_item_sku(&self, fragment: &str) -> Result<Vec<ItemSalesResponse>, ServiceError> {
        self.find_related(
            Query::<inventory_item::Model>::new().filter(Predicate::contains(inventory_item::Column::Sku, fragment)),
            item_sales::Column::InventoryItemId,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::fixtures::{actor, date, store};
    use crate::resources::inventory::{InventoryItemRequest, InventoryItemService};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn supply(store: &Arc<MemoryStore>, name: &str) -> Result<SupplyItemResponse, ServiceError> {
        SupplyItemService::new(store.clone())
            .create(
                &actor(),
                SupplyItemRequest {
                    id: None,
                    name: name.into(),
                    supplier_name: "Steelworks".into(),
                    unit_cost: Decimal::new(1500, 2),
                    quantity_available: 40,
                },
            )
            .await
    }

    async fn sale(store: &Arc<MemoryStore>) -> Result<ItemSalesResponse, ServiceError> {
        let item = InventoryItemService::new(store.clone())
            .create(
                &actor(),
                InventoryItemRequest {
                    id: None,
                    sku: format!("SKU-{}", Uuid::new_v4().simple()),
                    name: "Beam".into(),
                    quantity: 4,
                    unit_price: Decimal::new(90, 0),
                    reorder_level: 1,
                    location: None,
                },
            )
            .await?;
        ItemSalesService::new(store.clone())
            .create(
                &actor(),
                ItemSalesRequest {
                    id: None,
                    inventory_item_id: item.id,
                    quantity_sold: 2,
                    sale_price: Decimal::new(180, 0),
                    sale_date: date(2024, 9, 9),
                },
            )
            .await
    }

    fn request(number: &str, supplies: Vec<Uuid>, sales: Vec<Uuid>) -> ProcurementRequest {
        ProcurementRequest {
            id: None,
            procurement_number: number.into(),
            supplier_name: "Steelworks".into(),
            procurement_date: date(2024, 9, 1),
            total_cost: Decimal::new(600, 0),
            status: ProcurementStatus::Ordered,
            supply_item_ids: supplies,
            item_sales_ids: sales,
        }
    }

    #[tokio::test]
    async fn procurement_claims_and_releases_children() -> Result<(), ServiceError> {
        let store = store();
        let a = supply(&store, "Rebar").await?;
        let b = supply(&store, "Mesh").await?;
        let s = sale(&store).await?;
        let svc = ProcurementService::new(store.clone());

        let p = svc.create(&actor(), request("PR-1", vec![a.id, b.id], vec![s.id])).await?;
        assert_eq!(p.supply_item_ids.len(), 2);
        assert_eq!(p.item_sales_ids, vec![s.id]);
        let listed_before = common::metrics::operation_count("procurement", "find_supply_items", true);
        assert_eq!(svc.find_supply_items(p.id).await?.len(), 2);
        assert!(common::metrics::operation_count("procurement", "find_supply_items", true) > listed_before);

        let mut req = request("PR-1", vec![a.id], vec![]);
        req.id = Some(p.id);
        let p = svc.update(&actor(), p.id, req).await?;
        assert_eq!(p.supply_item_ids, vec![a.id]);
        assert!(svc.find_item_sales(p.id).await?.is_empty());
        assert_eq!(SupplyItemService::new(store.clone()).find_unassigned().await?.len(), 1);

        svc.delete(&actor(), p.id).await?;
        assert_eq!(SupplyItemService::new(store.clone()).find_unassigned().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn claimed_children_conflict_and_unknown_ones_are_not_found() -> Result<(), ServiceError> {
        let store = store();
        let a = supply(&store, "Rebar").await?;
        let svc = ProcurementService::new(store.clone());
        svc.create(&actor(), request("PR-1", vec![a.id], vec![])).await?;

        let err = svc.create(&actor(), request("PR-2", vec![a.id], vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = svc.create(&actor(), request("PR-3", vec![], vec![Uuid::new_v4()])).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("item sales"));
        Ok(())
    }

    #[tokio::test]
    async fn supply_item_update_keeps_its_procurement() -> Result<(), ServiceError> {
        let store = store();
        let a = supply(&store, "Rebar").await?;
        let p = ProcurementService::new(store.clone())
            .create(&actor(), request("PR-1", vec![a.id], vec![]))
            .await?;
        let items = SupplyItemService::new(store.clone());
        let updated = items
            .update(
                &actor(),
                a.id,
                SupplyItemRequest {
                    id: Some(a.id),
                    name: "Rebar 12mm".into(),
                    supplier_name: "Steelworks".into(),
                    unit_cost: Decimal::new(1600, 2),
                    quantity_available: 35,
                },
            )
            .await?;
        assert_eq!(updated.procurement_id, Some(p.id));
        assert_eq!(items.find_by_name("12MM").await?.len(), 1);
        Ok(())
    }
}
