//! Create `shipment` table with FK to `sales_order`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shipment::Table)
                    .if_not_exists()
                    .col(uuid(Shipment::Id).primary_key())
                    .col(string_len(Shipment::ShipmentNumber, 64).unique_key())
                    .col(uuid(Shipment::SalesOrderId))
                    .col(date(Shipment::ShipmentDate))
                    .col(string_len(Shipment::Destination, 512))
                    .col(string_len(Shipment::Carrier, 128))
                    .col(string_len(Shipment::Status, 32))
                    .col(timestamp_with_time_zone(Shipment::CreatedAt))
                    .col(timestamp_with_time_zone(Shipment::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shipment_sales_order")
                            .from(Shipment::Table, Shipment::SalesOrderId)
                            .to(SalesOrder::Table, SalesOrder::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Shipment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Shipment { Table, Id, ShipmentNumber, SalesOrderId, ShipmentDate, Destination, Carrier, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum SalesOrder { Table, Id }
