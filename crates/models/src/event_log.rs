use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// Audit trail row written alongside every mutation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub actor: String,
    pub action: AuditAction,
    pub entity_name: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<String>,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("event log");
