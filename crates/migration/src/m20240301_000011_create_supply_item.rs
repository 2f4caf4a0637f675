//! Create `supply_item` table with nullable FK to `procurement`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupplyItem::Table)
                    .if_not_exists()
                    .col(uuid(SupplyItem::Id).primary_key())
                    .col(string_len(SupplyItem::Name, 255))
                    .col(string_len(SupplyItem::SupplierName, 255))
                    .col(decimal_len(SupplyItem::UnitCost, 16, 2))
                    .col(integer(SupplyItem::QuantityAvailable))
                    .col(uuid_null(SupplyItem::ProcurementId))
                    .col(timestamp_with_time_zone(SupplyItem::CreatedAt))
                    .col(timestamp_with_time_zone(SupplyItem::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supply_item_procurement")
                            .from(SupplyItem::Table, SupplyItem::ProcurementId)
                            .to(Procurement::Table, Procurement::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SupplyItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SupplyItem { Table, Id, Name, SupplierName, UnitCost, QuantityAvailable, ProcurementId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Procurement { Table, Id }
