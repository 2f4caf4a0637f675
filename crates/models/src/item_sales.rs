use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{inventory_item, procurement};

/// Sales figures of one inventory item, optionally covered by a procurement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity_sold: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub sale_price: Decimal,
    pub sale_date: Date,
    pub procurement_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    InventoryItem,
    Procurement,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::InventoryItem => Entity::belongs_to(inventory_item::Entity)
                .from(Column::InventoryItemId)
                .to(inventory_item::Column::Id)
                .into(),
            Relation::Procurement => Entity::belongs_to(procurement::Entity)
                .from(Column::ProcurementId)
                .to(procurement::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("item sales");
