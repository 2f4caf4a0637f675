use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::DeliveryStatus;
use crate::sales_order;

/// Outbound shipment of a sales order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub shipment_number: String,
    pub sales_order_id: Uuid,
    pub shipment_date: Date,
    pub destination: String,
    pub carrier: String,
    pub status: DeliveryStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { SalesOrder }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::SalesOrder => Entity::belongs_to(sales_order::Entity)
                .from(Column::SalesOrderId)
                .to(sales_order::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("shipment");
