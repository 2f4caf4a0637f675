use std::borrow::Cow;

use chrono::NaiveDate;
use models::enums::DeliveryStatus;
use models::{delivery_item, inbound_delivery, inventory_item};
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

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InboundDeliveryRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub reference_number: String,
    #[validate(custom(function = "not_blank"))]
    pub supplier_name: String,
    pub delivery_date: NaiveDate,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundDeliveryResponse {
    pub id: Uuid,
    pub reference_number: String,
    pub supplier_name: String,
    pub delivery_date: NaiveDate,
    pub status: DeliveryStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct InboundDeliveries;

#[async_trait::async_trait]
impl Resource for InboundDeliveries {
    type Record = inbound_delivery::Model;
    type Request = InboundDeliveryRequest;
    type Response = InboundDeliveryResponse;

    const PATH: &'static str = "inbound-deliveries";

    fn body_id(request: &InboundDeliveryRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &InboundDeliveryRequest) -> inbound_delivery::Model {
        inbound_delivery::Model {
            id,
            reference_number: r.reference_number.trim().to_string(),
            supplier_name: r.supplier_name.trim().to_string(),
            delivery_date: r.delivery_date,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: inbound_delivery::Model, now: DateTimeWithTimeZone, r: &InboundDeliveryRequest) -> inbound_delivery::Model {
        inbound_delivery::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: inbound_delivery::Model) -> InboundDeliveryResponse {
        InboundDeliveryResponse {
            id: m.id,
            reference_number: m.reference_number,
            supplier_name: m.supplier_name,
            delivery_date: m.delivery_date,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &InboundDeliveryRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<inbound_delivery::Model, U>(
            repo,
            inbound_delivery::Column::ReferenceNumber,
            r.reference_number.trim().into(),
            "reference number",
            current,
        )
        .await
    }

    /// Items go with their delivery.
    async fn before_delete<U: Repository>(repo: &U, record: &inbound_delivery::Model) -> Result<(), ServiceError> {
        let items = repo
            .find(Query::<delivery_item::Model>::new().filter(Predicate::eq(delivery_item::Column::InboundDeliveryId, record.id)))
            .await?;
        for item in items {
            repo.delete::<delivery_item::Model>(item.id).await?;
        }
        Ok(())
    }
}

pub type InboundDeliveryService<S> = CrudService<InboundDeliveries, S>;

impl<S: Store> CrudService<InboundDeliveries, S> {
    pub async fn find_by_reference_number(&self, reference: &str) -> Result<InboundDeliveryResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(inbound_delivery::Column::ReferenceNumber, reference.trim().to_string())),
            reference,
        )
        .await
    }

    pub async fn find_by_supplier(&self, fragment: &str) -> Result<Vec<InboundDeliveryResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(inbound_delivery::Column::SupplierName, fragment))).await
    }

    pub async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<InboundDeliveryResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(inbound_delivery::Column::Status, status))).await
    }

    pub async fn find_by_delivery_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<InboundDeliveryResponse>, ServiceError> {
        let (from, to) = ordered_range("delivery_date", from, to)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(inbound_delivery::Column::DeliveryDate, from, to))
                .order_by(inbound_delivery::Column::DeliveryDate, Direction::Asc),
        )
        .await
    }
}

fn received_within_quantity(r: &DeliveryItemRequest) -> Result<(), ValidationError> {
    if r.received_quantity > r.quantity {
        return Err(ValidationError::new("received_quantity")
            .with_message(Cow::Borrowed("received quantity exceeds ordered quantity")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "received_within_quantity"))]
pub struct DeliveryItemRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub inbound_delivery_id: Uuid,
    pub inventory_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub received_quantity: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryItemResponse {
    pub id: Uuid,
    pub inbound_delivery_id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct DeliveryItems;

#[async_trait::async_trait]
impl Resource for DeliveryItems {
    type Record = delivery_item::Model;
    type Request = DeliveryItemRequest;
    type Response = DeliveryItemResponse;

    const PATH: &'static str = "delivery-items";

    fn body_id(request: &DeliveryItemRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &DeliveryItemRequest) -> delivery_item::Model {
        delivery_item::Model {
            id,
            inbound_delivery_id: r.inbound_delivery_id,
            inventory_item_id: r.inventory_item_id,
            quantity: r.quantity,
            received_quantity: r.received_quantity,
            notes: r.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: delivery_item::Model, now: DateTimeWithTimeZone, r: &DeliveryItemRequest) -> delivery_item::Model {
        delivery_item::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: delivery_item::Model) -> DeliveryItemResponse {
        DeliveryItemResponse {
            id: m.id,
            inbound_delivery_id: m.inbound_delivery_id,
            inventory_item_id: m.inventory_item_id,
            quantity: m.quantity,
            received_quantity: m.received_quantity,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &DeliveryItemRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<inbound_delivery::Model, U>(repo, r.inbound_delivery_id).await?;
        require::<inventory_item::Model, U>(repo, r.inventory_item_id).await?;
        Ok(())
    }
}

pub type DeliveryItemService<S> = CrudService<DeliveryItems, S>;

impl<S: Store> CrudService<DeliveryItems, S> {
    pub async fn find_by_delivery(&self, delivery_id: Uuid) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(delivery_item::Column::InboundDeliveryId, delivery_id))).await
    }

    pub async fn find_by_inventory_item(&self, item_id: Uuid) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(delivery_item::Column::InventoryItemId, item_id))).await
    }

    pub async fn find_by_quantity_greater_than(&self, min: i32) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        let min = positive_count("quantity", min)?;
        self.find_by(Query::new().filter(Predicate::gt(delivery_item::Column::Quantity, min))).await
    }

    /// Items whose delivery arrived within `[from, to]`.
    pub async fn find_by_delivery_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        let (from, to) = ordered_range("delivery_date", from, to)?;
        self.find_related(
            Query::<inbound_delivery::Model>::new().filter(Predicate::between(inbound_delivery::Column::DeliveryDate, from, to)),
            delivery_item::Column::InboundDeliveryId,
        )
        .await
    }

    /// Items of deliveries from suppliers whose name contains `fragment`.
    pub async fn find_by_supplier(&self, fragment: &str) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        self.find_related(
            Query::<inbound_delivery::Model>::new().filter(Predicate::contains(inbound_delivery::Column::SupplierName, fragment)),
            delivery_item::Column::InboundDeliveryId,
        )
        .await
    }

    /// Items still short of the ordered quantity.
    pub async fn find_outstanding(&self, delivery_id: Uuid) -> Result<Vec<DeliveryItemResponse>, ServiceError> {
        let items = self.find_by_delivery(delivery_id).await?;
        Ok(items.into_iter().filter(|i| i.received_quantity < i.quantity).collect())
    }
}
