//! Create `journal_entry` table with FK to `account`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JournalEntry::Table)
                    .if_not_exists()
                    .col(uuid(JournalEntry::Id).primary_key())
                    .col(uuid(JournalEntry::AccountId))
                    .col(date(JournalEntry::EntryDate))
                    .col(string_len(JournalEntry::Description, 512))
                    .col(decimal_len(JournalEntry::Debit, 16, 2))
                    .col(decimal_len(JournalEntry::Credit, 16, 2))
                    .col(string_len_null(JournalEntry::Reference, 128))
                    .col(timestamp_with_time_zone(JournalEntry::CreatedAt))
                    .col(timestamp_with_time_zone(JournalEntry::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_entry_account")
                            .from(JournalEntry::Table, JournalEntry::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(JournalEntry::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum JournalEntry { Table, Id, AccountId, EntryDate, Description, Debit, Credit, Reference, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Account { Table, Id }
