//! Create `procurement` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Procurement::Table)
                    .if_not_exists()
                    .col(uuid(Procurement::Id).primary_key())
                    .col(string_len(Procurement::ProcurementNumber, 64).unique_key())
                    .col(string_len(Procurement::SupplierName, 255))
                    .col(date(Procurement::ProcurementDate))
                    .col(decimal_len(Procurement::TotalCost, 16, 2))
                    .col(string_len(Procurement::Status, 32))
                    .col(timestamp_with_time_zone(Procurement::CreatedAt))
                    .col(timestamp_with_time_zone(Procurement::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Procurement::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Procurement { Table, Id, ProcurementNumber, SupplierName, ProcurementDate, TotalCost, Status, CreatedAt, UpdatedAt }
