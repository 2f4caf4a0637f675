//! Create `production_order` table; `product_id` references `inventory_item`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductionOrder::Table)
                    .if_not_exists()
                    .col(uuid(ProductionOrder::Id).primary_key())
                    .col(string_len(ProductionOrder::OrderNumber, 64).unique_key())
                    .col(uuid(ProductionOrder::ProductId))
                    .col(integer(ProductionOrder::Quantity))
                    .col(date(ProductionOrder::StartDate))
                    .col(date(ProductionOrder::EndDate))
                    .col(string_len(ProductionOrder::Status, 32))
                    .col(timestamp_with_time_zone(ProductionOrder::CreatedAt))
                    .col(timestamp_with_time_zone(ProductionOrder::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_order_inventory_item")
                            .from(ProductionOrder::Table, ProductionOrder::ProductId)
                            .to(InventoryItem::Table, InventoryItem::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ProductionOrder::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ProductionOrder { Table, Id, OrderNumber, ProductId, Quantity, StartDate, EndDate, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum InventoryItem { Table, Id }
