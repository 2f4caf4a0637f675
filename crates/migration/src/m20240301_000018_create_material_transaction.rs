//! Create `material_transaction` table with FK to `inventory_item`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaterialTransaction::Table)
                    .if_not_exists()
                    .col(uuid(MaterialTransaction::Id).primary_key())
                    .col(uuid(MaterialTransaction::InventoryItemId))
                    .col(string_len(MaterialTransaction::TransactionType, 16))
                    .col(integer(MaterialTransaction::Quantity))
                    .col(date(MaterialTransaction::TransactionDate))
                    .col(string_len_null(MaterialTransaction::Reference, 128))
                    .col(timestamp_with_time_zone(MaterialTransaction::CreatedAt))
                    .col(timestamp_with_time_zone(MaterialTransaction::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_transaction_inventory_item")
                            .from(MaterialTransaction::Table, MaterialTransaction::InventoryItemId)
                            .to(InventoryItem::Table, InventoryItem::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MaterialTransaction::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MaterialTransaction { Table, Id, InventoryItemId, TransactionType, Quantity, TransactionDate, Reference, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum InventoryItem { Table, Id }
