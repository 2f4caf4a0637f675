//! Create `tracking_info` table.
//!
//! One row per shipment, enforced by the unique `shipment_id`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrackingInfo::Table)
                    .if_not_exists()
                    .col(uuid(TrackingInfo::Id).primary_key())
                    .col(uuid(TrackingInfo::ShipmentId).unique_key())
                    .col(string_len(TrackingInfo::TrackingNumber, 128).unique_key())
                    .col(string_len(TrackingInfo::CurrentLocation, 255))
                    .col(date(TrackingInfo::EstimatedDelivery))
                    .col(string_len(TrackingInfo::Status, 32))
                    .col(timestamp_with_time_zone(TrackingInfo::CreatedAt))
                    .col(timestamp_with_time_zone(TrackingInfo::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracking_info_shipment")
                            .from(TrackingInfo::Table, TrackingInfo::ShipmentId)
                            .to(Shipment::Table, Shipment::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TrackingInfo::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TrackingInfo { Table, Id, ShipmentId, TrackingNumber, CurrentLocation, EstimatedDelivery, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Shipment { Table, Id }
