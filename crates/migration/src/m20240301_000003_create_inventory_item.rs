//! Create `inventory_item` table with unique `sku`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItem::Table)
                    .if_not_exists()
                    .col(uuid(InventoryItem::Id).primary_key())
                    .col(string_len(InventoryItem::Sku, 64).unique_key())
                    .col(string_len(InventoryItem::Name, 255))
                    .col(integer(InventoryItem::Quantity))
                    .col(decimal_len(InventoryItem::UnitPrice, 16, 2))
                    .col(integer(InventoryItem::ReorderLevel))
                    .col(string_len_null(InventoryItem::Location, 128))
                    .col(timestamp_with_time_zone(InventoryItem::CreatedAt))
                    .col(timestamp_with_time_zone(InventoryItem::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(InventoryItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum InventoryItem { Table, Id, Sku, Name, Quantity, UnitPrice, ReorderLevel, Location, CreatedAt, UpdatedAt }
