use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::ProductionStatus;
use crate::inventory_item;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub status: ProductionStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Product }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Product => Entity::belongs_to(inventory_item::Entity)
                .from(Column::ProductId)
                .to(inventory_item::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("production order");
