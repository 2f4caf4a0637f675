use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::TransactionType;
use crate::inventory_item;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub transaction_date: Date,
    pub reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { InventoryItem }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::InventoryItem => Entity::belongs_to(inventory_item::Entity)
                .from(Column::InventoryItemId)
                .to(inventory_item::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("material transaction");
