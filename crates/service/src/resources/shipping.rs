//! Outbound shipments and their carrier tracking.
//!
//! A shipment has at most one tracking record. Writing a tracking record with
//! status `DELIVERED` marks its shipment delivered in the same unit of work.

use chrono::NaiveDate;
use models::enums::DeliveryStatus;
use models::{sales_order, shipment, tracking_info};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::audit::now;
use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{require, Repository, Store};
use crate::validation::{not_blank, ordered_range};

use super::ensure_unique;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShipmentRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub shipment_number: String,
    pub sales_order_id: Uuid,
    pub shipment_date: NaiveDate,
    #[validate(custom(function = "not_blank"))]
    pub destination: String,
    #[validate(custom(function = "not_blank"))]
    pub carrier: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentResponse {
    pub id: Uuid,
    pub shipment_number: String,
    pub sales_order_id: Uuid,
    pub shipment_date: NaiveDate,
    pub destination: String,
    pub carrier: String,
    pub status: DeliveryStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Shipments;

async fn tracking_of<U: Repository>(repo: &U, shipment_id: Uuid) -> Result<Option<tracking_info::Model>, ServiceError> {
    repo.find_first(Query::new().filter(Predicate::eq(tracking_info::Column::ShipmentId, shipment_id)))
        .await
}

#[async_trait::async_trait]
impl Resource for Shipments {
    type Record = shipment::Model;
    type Request = ShipmentRequest;
    type Response = ShipmentResponse;

    const PATH: &'static str = "shipments";

    fn body_id(request: &ShipmentRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &ShipmentRequest) -> shipment::Model {
        shipment::Model {
            id,
            shipment_number: r.shipment_number.trim().to_string(),
            sales_order_id: r.sales_order_id,
            shipment_date: r.shipment_date,
            destination: r.destination.trim().to_string(),
            carrier: r.carrier.trim().to_string(),
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: shipment::Model, now: DateTimeWithTimeZone, r: &ShipmentRequest) -> shipment::Model {
        shipment::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: shipment::Model) -> ShipmentResponse {
        ShipmentResponse {
            id: m.id,
            shipment_number: m.shipment_number,
            sales_order_id: m.sales_order_id,
            shipment_date: m.shipment_date,
            destination: m.destination,
            carrier: m.carrier,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &ShipmentRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<sales_order::Model, U>(repo, r.sales_order_id).await?;
        ensure_unique::<shipment::Model, U>(
            repo,
            shipment::Column::ShipmentNumber,
            r.shipment_number.trim().into(),
            "shipment number",
            current,
        )
        .await
    }

    async fn before_delete<U: Repository>(repo: &U, record: &shipment::Model) -> Result<(), ServiceError> {
        if let Some(tracking) = tracking_of(repo, record.id).await? {
            repo.delete::<tracking_info::Model>(tracking.id).await?;
        }
        Ok(())
    }
}

pub type ShipmentService<S> = CrudService<Shipments, S>;

impl<S: Store> CrudService<Shipments, S> {
    pub async fn find_by_shipment_number(&self, number: &str) -> Result<ShipmentResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(shipment::Column::ShipmentNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_sales_order(&self, order_id: Uuid) -> Result<Vec<ShipmentResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(shipment::Column::SalesOrderId, order_id))).await
    }

    pub async fn find_by_order_number(&self, number: &str) -> Result<Vec<ShipmentResponse>, ServiceError> {
        self.find_related(
            Query::<sales_order::Model>::new().filter(Predicate::eq(sales_order::Column::OrderNumber, number.to_string())),
            shipment::Column::SalesOrderId,
        )
        .await
    }

    pub async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<ShipmentResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(shipment::Column::Status, status))).await
    }

    pub async fn find_by_carrier(&self, fragment: &str) -> Result<Vec<ShipmentResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(shipment::Column::Carrier, fragment))).await
    }

    pub async fn find_by_destination(&self, fragment: &str) -> Result<Vec<ShipmentResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(shipment::Column::Destination, fragment))).await
    }

    pub async fn find_by_shipment_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ShipmentResponse>, ServiceError> {
        let (from, to) = ordered_range("shipment_date", from, to)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(shipment::Column::ShipmentDate, from, to))
                .order_by(shipment::Column::ShipmentDate, Direction::Asc),
        )
        .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackingInfoRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub shipment_id: Uuid,
    #[validate(custom(function = "not_blank"))]
    pub tracking_number: String,
    #[validate(custom(function = "not_blank"))]
    pub current_location: String,
    pub estimated_delivery: NaiveDate,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingInfoResponse {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub tracking_number: String,
    pub current_location: String,
    pub estimated_delivery: NaiveDate,
    pub status: DeliveryStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct TrackingInfos;

#[async_trait::async_trait]
impl Resource for TrackingInfos {
    type Record = tracking_info::Model;
    type Request = TrackingInfoRequest;
    type Response = TrackingInfoResponse;

    const PATH: &'static str = "tracking-infos";

    fn body_id(request: &TrackingInfoRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &TrackingInfoRequest) -> tracking_info::Model {
        tracking_info::Model {
            id,
            shipment_id: r.shipment_id,
            tracking_number: r.tracking_number.trim().to_string(),
            current_location: r.current_location.trim().to_string(),
            estimated_delivery: r.estimated_delivery,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: tracking_info::Model, now: DateTimeWithTimeZone, r: &TrackingInfoRequest) -> tracking_info::Model {
        tracking_info::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: tracking_info::Model) -> TrackingInfoResponse {
        TrackingInfoResponse {
            id: m.id,
            shipment_id: m.shipment_id,
            tracking_number: m.tracking_number,
            current_location: m.current_location,
            estimated_delivery: m.estimated_delivery,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &TrackingInfoRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<shipment::Model, U>(repo, r.shipment_id).await?;
        if let Some(existing) = tracking_of(repo, r.shipment_id).await? {
            if Some(existing.id) != current {
                return Err(ServiceError::Conflict(format!("shipment {} already has tracking", r.shipment_id)));
            }
        }
        ensure_unique::<tracking_info::Model, U>(
            repo,
            tracking_info::Column::TrackingNumber,
            r.tracking_number.trim().into(),
            "tracking number",
            current,
        )
        .await
    }

    async fn after_write<U: Repository>(repo: &U, record: &tracking_info::Model, _r: &TrackingInfoRequest) -> Result<(), ServiceError> {
        if record.status != DeliveryStatus::Delivered {
            return Ok(());
        }
        let shipment = require::<shipment::Model, U>(repo, record.shipment_id).await?;
        if shipment.status != DeliveryStatus::Delivered {
            repo.update(shipment::Model { status: DeliveryStatus::Delivered, updated_at: now(), ..shipment }).await?;
            info!(shipment = %record.shipment_id, "shipment_delivered");
        }
        Ok(())
    }
}

pub type TrackingInfoService<S> = CrudService<TrackingInfos, S>;

impl<S: Store> CrudService<TrackingInfos, S> {
    /// The tracking record of a shipment; not-found when none was created.
    pub async fn find_tracking_for_shipment(&self, shipment_id: Uuid) -> Result<TrackingInfoResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(tracking_info::Column::ShipmentId, shipment_id)),
            format!("shipment {shipment_id}"),
        )
        .await
    }

    pub async fn find_by_tracking_number(&self, number: &str) -> Result<TrackingInfoResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(tracking_info::Column::TrackingNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<TrackingInfoResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(tracking_info::Column::Status, status))).await
    }

    pub async fn find_by_current_location(&self, fragment: &str) -> Result<Vec<TrackingInfoResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(tracking_info::Column::CurrentLocation, fragment))).await
    }

    pub async fn find_by_estimated_delivery_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TrackingInfoResponse>, ServiceError> {
        let (from, to) = ordered_range("estimated_delivery", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(tracking_info::Column::EstimatedDelivery, from, to)))
            .await
    }

    /// Tracking of shipments moved by carriers whose name contains `fragment`.
    pub async fn find_by_carrier(&self, fragment: &str) -> Result<Vec<TrackingInfoResponse>, ServiceError> {
        self.find_related(
            Query::<shipment::Model>::new().filter(Predicate::contains(shipment::Column::Carrier, fragment)),
            tracking_info::Column::ShipmentId,
        )
        .await
    }
}
