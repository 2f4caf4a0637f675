use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::QualityResult;
use crate::production_order;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quality_check")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub production_order_id: Uuid,
    pub check_date: Date,
    pub inspector: String,
    pub result: QualityResult,
    pub defects_found: i32,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { ProductionOrder }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ProductionOrder => Entity::belongs_to(production_order::Entity)
                .from(Column::ProductionOrderId)
                .to(production_order::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("quality check");
