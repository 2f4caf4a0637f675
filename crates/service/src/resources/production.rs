use std::borrow::Cow;

use chrono::NaiveDate;
use models::enums::{ProductionStatus, QualityResult};
use models::{inventory_item, production_order, quality_check};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{require, Repository, Store};
use crate::validation::{not_blank, ordered_range, positive_count};

use super::ensure_unique;

fn starts_before_end(r: &ProductionOrderRequest) -> Result<(), ValidationError> {
    if r.start_date >= r.end_date {
        return Err(ValidationError::new("end_date").with_message(Cow::Borrowed("start date must be before end date")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "starts_before_end"))]
pub struct ProductionOrderRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub order_number: String,
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProductionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProductionStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct ProductionOrders;

#[async_trait::async_trait]
impl Resource for ProductionOrders {
    type Record = production_order::Model;
    type Request = ProductionOrderRequest;
    type Response = ProductionOrderResponse;

    const PATH: &'static str = "production-orders";

    fn body_id(request: &ProductionOrderRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &ProductionOrderRequest) -> production_order::Model {
        production_order::Model {
            id,
            order_number: r.order_number.trim().to_string(),
            product_id: r.product_id,
            quantity: r.quantity,
            start_date: r.start_date,
            end_date: r.end_date,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: production_order::Model, now: DateTimeWithTimeZone, r: &ProductionOrderRequest) -> production_order::Model {
        production_order::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: production_order::Model) -> ProductionOrderResponse {
        ProductionOrderResponse {
            id: m.id,
            order_number: m.order_number,
            product_id: m.product_id,
            quantity: m.quantity,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &ProductionOrderRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<inventory_item::Model, U>(repo, r.product_id).await?;
        ensure_unique::<production_order::Model, U>(
            repo,
            production_order::Column::OrderNumber,
            r.order_number.trim().into(),
            "order number",
            current,
        )
        .await
    }

    /// Quality checks are part of the order's record.
    async fn before_delete<U: Repository>(repo: &U, record: &production_order::Model) -> Result<(), ServiceError> {
        let checks = repo
            .find(Query::<quality_check::Model>::new().filter(Predicate::eq(quality_check::Column::ProductionOrderId, record.id)))
            .await?;
        for check in checks {
            repo.delete::<quality_check::Model>(check.id).await?;
        }
        Ok(())
    }
}

pub type ProductionOrderService<S> = CrudService<ProductionOrders, S>;

impl<S: Store> CrudService<ProductionOrders, S> {
    pub async fn find_by_order_number(&self, number: &str) -> Result<ProductionOrderResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(production_order::Column::OrderNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_product(&self, product_id: Uuid) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(production_order::Column::ProductId, product_id))).await
    }

    pub async fn find_by_product_sku(&self, fragment: &str) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        self.find_related(
            Query::<inventory_item::Model>::new().filter(Predicate::contains(inventory_item::Column::Sku, fragment)),
            production_order::Column::ProductId,
        )
        .await
    }

    pub async fn find_by_status(&self, status: ProductionStatus) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(production_order::Column::Status, status))).await
    }

    pub async fn find_by_quantity_greater_than(&self, min: i32) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        let min = positive_count("quantity", min)?;
        self.find_by(Query::new().filter(Predicate::gt(production_order::Column::Quantity, min))).await
    }

    pub async fn find_starting_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        let (from, to) = ordered_range("start_date", from, to)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(production_order::Column::StartDate, from, to))
                .order_by(production_order::Column::StartDate, Direction::Asc),
        )
        .await
    }

    /// Planned or running orders whose end date is before `today`.
    pub async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<ProductionOrderResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::lt(production_order::Column::EndDate, today))
                .filter(Predicate::is_in(
                    production_order::Column::Status,
                    [ProductionStatus::Planned, ProductionStatus::InProgress],
                )),
        )
        .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QualityCheckRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub production_order_id: Uuid,
    pub check_date: NaiveDate,
    #[validate(custom(function = "not_blank"))]
    pub inspector: String,
    pub result: QualityResult,
    #[validate(range(min = 0))]
    pub defects_found: i32,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheckResponse {
    pub id: Uuid,
    pub production_order_id: Uuid,
    pub check_date: NaiveDate,
    pub inspector: String,
    pub result: QualityResult,
    pub defects_found: i32,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct QualityChecks;

#[async_trait::async_trait]
impl Resource for QualityChecks {
    type Record = quality_check::Model;
    type Request = QualityCheckRequest;
    type Response = QualityCheckResponse;

    const PATH: &'static str = "quality-checks";

    fn body_id(request: &QualityCheckRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &QualityCheckRequest) -> quality_check::Model {
        quality_check::Model {
            id,
            production_order_id: r.production_order_id,
            check_date: r.check_date,
            inspector: r.inspector.trim().to_string(),
            result: r.result,
            defects_found: r.defects_found,
            remarks: r.remarks.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: quality_check::Model, now: DateTimeWithTimeZone, r: &QualityCheckRequest) -> quality_check::Model {
        quality_check::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: quality_check::Model) -> QualityCheckResponse {
        QualityCheckResponse {
            id: m.id,
            production_order_id: m.production_order_id,
            check_date: m.check_date,
            inspector: m.inspector,
            result: m.result,
            defects_found: m.defects_found,
            remarks: m.remarks,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &QualityCheckRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<production_order::Model, U>(repo, r.production_order_id).await?;
        Ok(())
    }
}

pub type QualityCheckService<S> = CrudService<QualityChecks, S>;

impl<S: Store> CrudService<QualityChecks, S> {
    pub async fn find_by_production_order(&self, order_id: Uuid) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(quality_check::Column::ProductionOrderId, order_id))
                .order_by(quality_check::Column::CheckDate, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_order_number(&self, number: &str) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        self.find_related(
            Query::<production_order::Model>::new()
                .filter(Predicate::eq(production_order::Column::OrderNumber, number.trim().to_string())),
            quality_check::Column::ProductionOrderId,
        )
        .await
    }

    pub async fn find_by_result(&self, result: QualityResult) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(quality_check::Column::Result, result))).await
    }

    pub async fn find_by_inspector(&self, fragment: &str) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(quality_check::Column::Inspector, fragment))).await
    }

    pub async fn find_by_defects_greater_than(&self, min: i32) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        let min = positive_count("defects_found", min)?;
        self.find_by(Query::new().filter(Predicate::gt(quality_check::Column::DefectsFound, min))).await
    }

    pub async fn find_by_check_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<QualityCheckResponse>, ServiceError> {
        let (from, to) = ordered_range("check_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(quality_check::Column::CheckDate, from, to))).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
        use crate::resources::fixtures::{actor, date, store};
    use crate::resources::inventory::{InventoryItemRequest, InventoryItemService};
    use crate::store::memory::Operation;
    use crate::store::MemoryStore;

    async fn product(store: &Arc<MemoryStore>) -> Result<Uuid, ServiceError> {
        let item = InventoryItemService::new(store.clone())
            .create(
                &actor(),
                InventoryItemRequest {
                    id: None,
                    sku: "chair-01".into(),
                    name: "Chair".into(),
                    quantity: 0,
                    unit_price: Decimal::new(4500, 2),
                    reorder_level: 5,
                    location: None,
                },
            )
            .await?;
        Ok(item.id)
    }

    fn order(number: &str, product_id: Uuid) -> ProductionOrderRequest {
        ProductionOrderRequest {
            id: None,
            order_number: number.into(),
            product_id,
            quantity: 50,
            start_date: date(2024, 3, 1),
            end_date: date(2024, 3, 15),
            status: ProductionStatus::Planned,
        }
    }

    fn check(order_id: Uuid, defects: i32) -> QualityCheckRequest {
        QualityCheckRequest {
            id: None,
            production_order_id: order_id,
            check_date: date(2024, 3, 16),
            inspector: "R. Okafor".into(),
            result: if defects == 0 { QualityResult::Passed } else { QualityResult::Failed },
            defects_found: defects,
            remarks: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn end_before_start_is_rejected_before_storage() -> Result<(), ServiceError> {
        let store = store();
        let product_id = product(&store).await?;
        store.reset_calls();
        let mut req = order("PO-1", product_id);
        req.end_date = date(2024, 2, 1);
        let err = ProductionOrderService::new(store.clone()).create(&actor(), req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.touches("production order"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let err = ProductionOrderService::new(store())
            .create(&actor(), order("PO-1", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.missing_entity(), Some("inventory item"));
    }

    #[tokio::test]
    async fn overdue_orders_exclude_finished_ones() -> Result<(), ServiceError> {
        let store = store();
        let product_id = product(&store).await?;
        let svc = ProductionOrderService::new(store.clone());
        let open = svc.create(&actor(), order("PO-1", product_id)).await?;
        let mut done = order("PO-2", product_id);
        done.status = ProductionStatus::Completed;
        svc.create(&actor(), done).await?;

        let overdue = svc.find_overdue(date(2024, 4, 1)).await?;
        assert_eq!(overdue.iter().map(|o| o.id).collect::<Vec<_>>(), vec![open.id]);
        assert!(svc.find_overdue(date(2024, 3, 10)).await?.is_empty());
        assert_eq!(svc.find_by_product_sku("CHAIR").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn checks_follow_their_order() -> Result<(), ServiceError> {
        let store = store();
        let product_id = product(&store).await?;
        let orders = ProductionOrderService::new(store.clone());
        let po = orders.create(&actor(), order("PO-7", product_id)).await?;
        let checks = QualityCheckService::new(store.clone());
        let passed = checks.create(&actor(), check(po.id, 0)).await?;
        checks.create(&actor(), check(po.id, 3)).await?;

        assert_eq!(passed.remarks, None);
        assert_eq!(checks.find_by_order_number("PO-7").await?.len(), 2);
        assert_eq!(checks.find_by_defects_greater_than(1).await?.len(), 1);
        assert!(checks.find_by_defects_greater_than(-1).await.is_err());

        orders.delete(&actor(), po.id).await?;
        assert_eq!(store.calls("quality check", Operation::Delete), 2);
        assert!(checks.find_all(None).await?.is_empty());
        Ok(())
    }
}
