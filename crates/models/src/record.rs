//! Common shape of every persisted entity.
//!
//! Services and stores are written once against [`Record`]; each entity module
//! opts in with [`impl_record!`](crate::impl_record).

use sea_orm::{ActiveModelTrait, EntityTrait, FromQueryResult, Iterable, ModelTrait};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// Column enum of a record's entity.
pub type ColumnOf<R> = <<R as ModelTrait>::Entity as EntityTrait>::Column;

pub trait Record:
    ModelTrait + FromQueryResult + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type ActiveModel: ActiveModelTrait<Entity = <Self as ModelTrait>::Entity> + Send + Sync;

    /// Lowercase entity name, also the storage key of the in-memory store.
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    fn id_column() -> ColumnOf<Self>;

    /// Active model with every column `Set`, suitable for insert and full overwrite.
    fn to_active_model(&self) -> Self::ActiveModel {
        let mut am = <Self::ActiveModel as ActiveModelTrait>::default();
        for col in ColumnOf::<Self>::iter() {
            am.set(col, self.get(col));
        }
        am
    }
}

/// Implements [`Record`] for the `Model` of the calling entity module.
#[macro_export]
macro_rules! impl_record {
    ($name:literal) => {
        impl $crate::record::Record for Model {
            type ActiveModel = ActiveModel;
            const NAME: &'static str = $name;

            fn id(&self) -> Uuid {
                self.id
            }

            fn id_column() -> Column {
                Column::Id
            }
        }
    };
}
