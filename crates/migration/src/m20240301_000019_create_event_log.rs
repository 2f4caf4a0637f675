//! Create `event_log` audit table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventLog::Table)
                    .if_not_exists()
                    .col(uuid(EventLog::Id).primary_key())
                    .col(string_len(EventLog::Actor, 255))
                    .col(string_len(EventLog::Action, 16))
                    .col(string_len(EventLog::EntityName, 64))
                    .col(uuid_null(EventLog::EntityId))
                    .col(text_null(EventLog::Details))
                    .col(timestamp_with_time_zone(EventLog::OccurredAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EventLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum EventLog { Table, Id, Actor, Action, EntityName, EntityId, Details, OccurredAt }
