//! Create `item_sales` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemSales::Table)
                    .if_not_exists()
                    .col(uuid(ItemSales::Id).primary_key())
                    .col(uuid(ItemSales::InventoryItemId))
                    .col(integer(ItemSales::QuantitySold))
                    .col(decimal_len(ItemSales::SalePrice, 16, 2))
                    .col(date(ItemSales::SaleDate))
                    .col(uuid_null(ItemSales::ProcurementId))
                    .col(timestamp_with_time_zone(ItemSales::CreatedAt))
                    .col(timestamp_with_time_zone(ItemSales::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_sales_inventory_item")
                            .from(ItemSales::Table, ItemSales::InventoryItemId)
                            .to(InventoryItem::Table, InventoryItem::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_sales_procurement")
                            .from(ItemSales::Table, ItemSales::ProcurementId)
                            .to(Procurement::Table, Procurement::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ItemSales::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ItemSales { Table, Id, InventoryItemId, QuantitySold, SalePrice, SaleDate, ProcurementId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum InventoryItem { Table, Id }

#[derive(DeriveIden)]
enum Procurement { Table, Id }
