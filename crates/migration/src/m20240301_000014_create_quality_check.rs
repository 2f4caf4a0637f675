//! Create `quality_check` table with FK to `production_order`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QualityCheck::Table)
                    .if_not_exists()
                    .col(uuid(QualityCheck::Id).primary_key())
                    .col(uuid(QualityCheck::ProductionOrderId))
                    .col(date(QualityCheck::CheckDate))
                    .col(string_len(QualityCheck::Inspector, 128))
                    .col(string_len(QualityCheck::Result, 16))
                    .col(integer(QualityCheck::DefectsFound))
                    .col(text_null(QualityCheck::Remarks))
                    .col(timestamp_with_time_zone(QualityCheck::CreatedAt))
                    .col(timestamp_with_time_zone(QualityCheck::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quality_check_production_order")
                            .from(QualityCheck::Table, QualityCheck::ProductionOrderId)
                            .to(ProductionOrder::Table, ProductionOrder::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(QualityCheck::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum QualityCheck { Table, Id, ProductionOrderId, CheckDate, Inspector, Result, DefectsFound, Remarks, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum ProductionOrder { Table, Id }
