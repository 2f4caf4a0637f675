//! Create `sales_order` table with FKs to `customer` and `invoice`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SalesOrder::Table)
                    .if_not_exists()
                    .col(uuid(SalesOrder::Id).primary_key())
                    .col(string_len(SalesOrder::OrderNumber, 64).unique_key())
                    .col(uuid(SalesOrder::CustomerId))
                    .col(uuid_null(SalesOrder::InvoiceId))
                    .col(date(SalesOrder::OrderDate))
                    .col(decimal_len(SalesOrder::TotalAmount, 16, 2))
                    .col(string_len(SalesOrder::Status, 32))
                    .col(timestamp_with_time_zone(SalesOrder::CreatedAt))
                    .col(timestamp_with_time_zone(SalesOrder::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_customer")
                            .from(SalesOrder::Table, SalesOrder::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_invoice")
                            .from(SalesOrder::Table, SalesOrder::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SalesOrder::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SalesOrder { Table, Id, OrderNumber, CustomerId, InvoiceId, OrderDate, TotalAmount, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Customer { Table, Id }

#[derive(DeriveIden)]
enum Invoice { Table, Id }
