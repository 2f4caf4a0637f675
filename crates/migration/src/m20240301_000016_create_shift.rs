//! Create `shift` table with FK to `employee`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shift::Table)
                    .if_not_exists()
                    .col(uuid(Shift::Id).primary_key())
                    .col(uuid(Shift::EmployeeId))
                    .col(date(Shift::ShiftDate))
                    .col(time(Shift::StartTime))
                    .col(time(Shift::EndTime))
                    .col(text_null(Shift::Notes))
                    .col(timestamp_with_time_zone(Shift::CreatedAt))
                    .col(timestamp_with_time_zone(Shift::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shift_employee")
                            .from(Shift::Table, Shift::EmployeeId)
                            .to(Employee::Table, Employee::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Shift::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Shift { Table, Id, EmployeeId, ShiftDate, StartTime, EndTime, Notes, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Employee { Table, Id }
