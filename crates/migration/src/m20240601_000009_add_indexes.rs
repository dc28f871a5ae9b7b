use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: lookups by username (login) and by rw (admin scoping)
        manager
            .create_index(
                Index::create()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_users_rw")
                    .table(Users::Table)
                    .col(Users::Rw)
                    .to_owned(),
            )
            .await?;

        // Umkm: owner filter and newest-first listing
        manager
            .create_index(
                Index::create()
                    .name("idx_umkm_user")
                    .table(Umkm::Table)
                    .col(Umkm::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_umkm_created_at")
                    .table(Umkm::Table)
                    .col(Umkm::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_users_username").table(Users::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_users_rw").table(Users::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_umkm_user").table(Umkm::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_umkm_created_at").table(Umkm::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Username, Rw }

#[derive(DeriveIden)]
enum Umkm { Table, UserId, CreatedAt }
