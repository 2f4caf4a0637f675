//! Create `account` table.
//!
//! Ledger accounts; `account_number` is unique.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::AccountNumber, 64).unique_key())
                    .col(string_len(Account::Name, 255))
                    .col(string_len(Account::AccountType, 16))
                    .col(decimal_len(Account::Balance, 16, 2))
                    .col(string_len(Account::Currency, 3))
                    .col(timestamp_with_time_zone(Account::CreatedAt))
                    .col(timestamp_with_time_zone(Account::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Account::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Account { Table, Id, AccountNumber, Name, AccountType, Balance, Currency, CreatedAt, UpdatedAt }
