//! Create `token` table.
//!
//! Issued JWTs keyed by their `jti`, with revocation flags.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Token::Table)
                    .if_not_exists()
                    .col(uuid(Token::Id).primary_key())
                    .col(uuid(Token::UserId))
                    .col(string_len(Token::TokenType, 16))
                    .col(boolean(Token::Revoked))
                    .col(boolean(Token::Expired))
                    .col(timestamp_with_time_zone(Token::IssuedAt))
                    .col(timestamp_with_time_zone(Token::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_token_user")
                            .from(Token::Table, Token::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Token::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Token { Table, Id, UserId, TokenType, Revoked, Expired, IssuedAt, ExpiresAt }

#[derive(DeriveIden)]
enum User { Table, Id }
