//! Create `delivery_item` table with FKs to `inbound_delivery` and `inventory_item`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliveryItem::Table)
                    .if_not_exists()
                    .col(uuid(DeliveryItem::Id).primary_key())
                    .col(uuid(DeliveryItem::InboundDeliveryId))
                    .col(uuid(DeliveryItem::InventoryItemId))
                    .col(integer(DeliveryItem::Quantity))
                    .col(integer(DeliveryItem::ReceivedQuantity))
                    .col(text_null(DeliveryItem::Notes))
                    .col(timestamp_with_time_zone(DeliveryItem::CreatedAt))
                    .col(timestamp_with_time_zone(DeliveryItem::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_item_inbound_delivery")
                            .from(DeliveryItem::Table, DeliveryItem::InboundDeliveryId)
                            .to(InboundDelivery::Table, InboundDelivery::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_item_inventory_item")
                            .from(DeliveryItem::Table, DeliveryItem::InventoryItemId)
                            .to(InventoryItem::Table, InventoryItem::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(DeliveryItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum DeliveryItem { Table, Id, InboundDeliveryId, InventoryItemId, Quantity, ReceivedQuantity, Notes, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum InboundDelivery { Table, Id }

#[derive(DeriveIden)]
enum InventoryItem { Table, Id }
