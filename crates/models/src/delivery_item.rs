use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{inbound_delivery, inventory_item};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inbound_delivery_id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    InboundDelivery,
    InventoryItem,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::InboundDelivery => Entity::belongs_to(inbound_delivery::Entity)
                .from(Column::InboundDeliveryId)
                .to(inbound_delivery::Column::Id)
                .into(),
            Relation::InventoryItem => Entity::belongs_to(inventory_item::Entity)
                .from(Column::InventoryItemId)
                .to(inventory_item::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("delivery item");
