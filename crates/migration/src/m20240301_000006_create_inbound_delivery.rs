//! Create `inbound_delivery` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InboundDelivery::Table)
                    .if_not_exists()
                    .col(uuid(InboundDelivery::Id).primary_key())
                    .col(string_len(InboundDelivery::ReferenceNumber, 64).unique_key())
                    .col(string_len(InboundDelivery::SupplierName, 255))
                    .col(date(InboundDelivery::DeliveryDate))
                    .col(string_len(InboundDelivery::Status, 32))
                    .col(timestamp_with_time_zone(InboundDelivery::CreatedAt))
                    .col(timestamp_with_time_zone(InboundDelivery::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(InboundDelivery::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum InboundDelivery { Table, Id, ReferenceNumber, SupplierName, DeliveryDate, Status, CreatedAt, UpdatedAt }
