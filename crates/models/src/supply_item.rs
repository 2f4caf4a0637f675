use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::procurement;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supply_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub supplier_name: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub unit_cost: Decimal,
    pub quantity_available: i32,
    pub procurement_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Procurement }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Procurement => Entity::belongs_to(procurement::Entity)
                .from(Column::ProcurementId)
                .to(procurement::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("supply item");
