use sea_orm_migration::prelude::*;

/// (index name, table, column) for foreign key lookups and range filters.
const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_sales_order_customer", "sales_order", "customer_id"),
    ("idx_sales_order_invoice", "sales_order", "invoice_id"),
    ("idx_delivery_item_delivery", "delivery_item", "inbound_delivery_id"),
    ("idx_inbound_delivery_date", "inbound_delivery", "delivery_date"),
    ("idx_shipment_sales_order", "shipment", "sales_order_id"),
    ("idx_supply_item_procurement", "supply_item", "procurement_id"),
    ("idx_item_sales_procurement", "item_sales", "procurement_id"),
    ("idx_quality_check_order", "quality_check", "production_order_id"),
    ("idx_shift_employee", "shift", "employee_id"),
    ("idx_journal_entry_account", "journal_entry", "account_id"),
    ("idx_event_log_entity", "event_log", "entity_id"),
    ("idx_token_user", "token", "user_id"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, column) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(*name)
                        .table(Alias::new(*table))
                        .col(Alias::new(*column))
                        .to_owned(),
                )
                .await?;
        }
        // credentials are looked up per user and must stay one row per user
        manager
            .create_index(
                Index::create()
                    .name("uniq_user_credentials_user")
                    .table(UserCredentials::Table)
                    .col(UserCredentials::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        manager
            .drop_index(Index::drop().name("uniq_user_credentials_user").table(UserCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserCredentials { Table, UserId }
