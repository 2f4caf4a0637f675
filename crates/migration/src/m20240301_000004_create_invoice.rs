//! Create `invoice` table.
//!
//! Sales orders point at invoices, so this table carries no foreign keys.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(uuid(Invoice::Id).primary_key())
                    .col(string_len(Invoice::InvoiceNumber, 64).unique_key())
                    .col(date(Invoice::IssueDate))
                    .col(date(Invoice::DueDate))
                    .col(decimal_len(Invoice::Amount, 16, 2))
                    .col(string_len(Invoice::Status, 32))
                    .col(timestamp_with_time_zone(Invoice::CreatedAt))
                    .col(timestamp_with_time_zone(Invoice::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Invoice::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Invoice { Table, Id, InvoiceNumber, IssueDate, DueDate, Amount, Status, CreatedAt, UpdatedAt }
