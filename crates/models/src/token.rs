use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::TokenType;
use crate::user;

/// Issued JWT bookkeeping. The row id doubles as the token's `jti` claim.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_type: TokenType,
    pub revoked: bool,
    pub expired: bool,
    pub issued_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("token");

impl Model {
    /// Still usable: neither revoked nor flagged expired.
    pub fn is_live(&self) -> bool {
        !self.revoked && !self.expired
    }
}
