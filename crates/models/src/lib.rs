//! SeaORM entities of the ERP domain.
//!
//! Every entity implements [`record::Record`] so the service layer can store and
//! query it generically.

pub mod db;
pub mod record;
pub mod enums;

pub mod account;
pub mod customer;
pub mod inventory_item;
pub mod sales_order;
pub mod invoice;
pub mod inbound_delivery;
pub mod delivery_item;
pub mod shipment;
pub mod tracking_info;
pub mod procurement;
pub mod supply_item;
pub mod item_sales;
pub mod production_order;
pub mod quality_check;
pub mod employee;
pub mod shift;
pub mod journal_entry;
pub mod material_transaction;
pub mod event_log;
pub mod user;
pub mod user_credentials;
pub mod token;

pub use record::{ColumnOf, Record};

#[cfg(test)]
mod tests;
