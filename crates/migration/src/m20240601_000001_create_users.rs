//! Create `users` table (registry of self-registered accounts).
//!
//! Username uniqueness is checked at registration time, not by the schema.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(uuid(Users::Id).primary_key())
                    .col(string_len(Users::Username, 64).not_null())
                    .col(string_len(Users::DisplayName, 128).not_null())
                    .col(string_len(Users::Role, 16).not_null())
                    .col(ColumnDef::new(Users::Rw).string_len(16).null())
                    .col(timestamp_with_time_zone(Users::CreatedAt).not_null())
                    .col(boolean(Users::PasswordChanged).default(false).not_null())
                    .col(
                        ColumnDef::new(Users::PasswordChangedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, Username, DisplayName, Role, Rw, CreatedAt, PasswordChanged, PasswordChangedAt }
