//! Create `umkm` table holding business profiles.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Umkm::Table)
                    .if_not_exists()
                    .col(uuid(Umkm::Id).primary_key())
                    .col(uuid(Umkm::UserId).not_null())
                    .col(string_len(Umkm::Name, 255).not_null())
                    .col(string_len(Umkm::OwnerName, 255).not_null())
                    .col(string_len(Umkm::BusinessType, 64).not_null())
                    .col(string_len(Umkm::Status, 64).not_null())
                    .col(ColumnDef::new(Umkm::Category).string_len(128).null())
                    .col(ColumnDef::new(Umkm::Address).text().null())
                    .col(ColumnDef::new(Umkm::Phone).string_len(32).null())
                    .col(ColumnDef::new(Umkm::Product).string_len(255).null())
                    .col(ColumnDef::new(Umkm::MonthlyProduction).big_integer().null())
                    .col(ColumnDef::new(Umkm::ProductionUnit).string_len(32).null())
                    .col(ColumnDef::new(Umkm::Capital).big_integer().null())
                    .col(ColumnDef::new(Umkm::MonthlyRevenue).big_integer().null())
                    .col(ColumnDef::new(Umkm::EmployeeCount).integer().null())
                    .col(timestamp_with_time_zone(Umkm::RegisteredAt).not_null())
                    .col(timestamp_with_time_zone(Umkm::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Umkm::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Umkm::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Umkm {
    Table,
    Id,
    UserId,
    Name,
    OwnerName,
    BusinessType,
    Status,
    Category,
    Address,
    Phone,
    Product,
    MonthlyProduction,
    ProductionUnit,
    Capital,
    MonthlyRevenue,
    EmployeeCount,
    RegisteredAt,
    CreatedAt,
    UpdatedAt,
}
