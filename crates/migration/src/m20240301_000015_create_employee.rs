//! Create `employee` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(uuid(Employee::Id).primary_key())
                    .col(string_len(Employee::EmployeeNumber, 32).unique_key())
                    .col(string_len(Employee::FirstName, 128))
                    .col(string_len(Employee::LastName, 128))
                    .col(string_len(Employee::Email, 255))
                    .col(string_len(Employee::Position, 128))
                    .col(decimal_len(Employee::HourlyRate, 10, 2))
                    .col(timestamp_with_time_zone(Employee::CreatedAt))
                    .col(timestamp_with_time_zone(Employee::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Employee::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Employee { Table, Id, EmployeeNumber, FirstName, LastName, Email, Position, HourlyRate, CreatedAt, UpdatedAt }
