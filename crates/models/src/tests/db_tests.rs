use anyhow::Result;
use chrono::Utc;
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::db::connect;
use crate::enums::AccountType;
use crate::record::Record;
use crate::account;

fn db_tests_disabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

/// Insert and read back an account inside a rolled back transaction.
#[tokio::test]
async fn account_roundtrip_in_transaction() -> Result<()> {
    if db_tests_disabled() {
        println!("Skipping database tests (no DATABASE_URL or SKIP_DB_TESTS set)");
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let txn = db.begin().await?;
    let now = Utc::now().into();
    let model = account::Model {
        id: Uuid::new_v4(),
        account_number: format!("T-{}", Uuid::new_v4().simple()),
        name: "Test".into(),
        account_type: AccountType::Revenue,
        balance: Decimal::new(100, 0),
        currency: "USD".into(),
        created_at: now,
        updated_at: now,
    };
    model.to_active_model().insert(&txn).await?;
    let found = account::Entity::find_by_id(model.id).one(&txn).await?;
    assert_eq!(found.map(|a| a.balance), Some(Decimal::new(100, 0)));
    txn.rollback().await?;
    Ok(())
}
