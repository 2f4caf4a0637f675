use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::ProcurementStatus;

/// Purchase process grouping supply items and the item sales it covers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "procurement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub procurement_number: String,
    pub supplier_name: String,
    pub procurement_date: Date,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_cost: Decimal,
    pub status: ProcurementStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("procurement");
