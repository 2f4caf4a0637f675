//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_account;
mod m20240301_000002_create_customer;
mod m20240301_000003_create_inventory_item;
mod m20240301_000004_create_invoice;
mod m20240301_000005_create_sales_order;
mod m20240301_000006_create_inbound_delivery;
mod m20240301_000007_create_delivery_item;
mod m20240301_000008_create_shipment;
mod m20240301_000009_create_tracking_info;
mod m20240301_000010_create_procurement;
mod m20240301_000011_create_supply_item;
mod m20240301_000012_create_item_sales;
mod m20240301_000013_create_production_order;
mod m20240301_000014_create_quality_check;
mod m20240301_000015_create_employee;
mod m20240301_000016_create_shift;
mod m20240301_000017_create_journal_entry;
mod m20240301_000018_create_material_transaction;
mod m20240301_000019_create_event_log;
mod m20240301_000020_create_user;
mod m20240301_000021_create_user_credentials;
mod m20240301_000022_create_token;
mod m20240301_000100_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_account::Migration),
            Box::new(m20240301_000002_create_customer::Migration),
            Box::new(m20240301_000003_create_inventory_item::Migration),
            Box::new(m20240301_000004_create_invoice::Migration),
            Box::new(m20240301_000005_create_sales_order::Migration),
            Box::new(m20240301_000006_create_inbound_delivery::Migration),
            Box::new(m20240301_000007_create_delivery_item::Migration),
            Box::new(m20240301_000008_create_shipment::Migration),
            Box::new(m20240301_000009_create_tracking_info::Migration),
            Box::new(m20240301_000010_create_procurement::Migration),
            Box::new(m20240301_000011_create_supply_item::Migration),
            Box::new(m20240301_000012_create_item_sales::Migration),
            Box::new(m20240301_000013_create_production_order::Migration),
            Box::new(m20240301_000014_create_quality_check::Migration),
            Box::new(m20240301_000015_create_employee::Migration),
            Box::new(m20240301_000016_create_shift::Migration),
            Box::new(m20240301_000017_create_journal_entry::Migration),
            Box::new(m20240301_000018_create_material_transaction::Migration),
            Box::new(m20240301_000019_create_event_log::Migration),
            Box::new(m20240301_000020_create_user::Migration),
            Box::new(m20240301_000021_create_user_credentials::Migration),
            Box::new(m20240301_000022_create_token::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000100_add_indexes::Migration),
        ]
    }
}
