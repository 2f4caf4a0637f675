use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::account;

/// Single-sided posting against an account; exactly one of debit/credit is non-zero.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub entry_date: Date,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub credit: Decimal,
    pub reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Account }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Account => Entity::belongs_to(account::Entity)
                .from(Column::AccountId)
                .to(account::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

crate::impl_record!("journal entry");
