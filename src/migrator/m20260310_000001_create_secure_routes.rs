use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_farmers::Farmers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SecureRoutes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecureRoutes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SecureRoutes::FarmerId).integer().not_null())
                    .col(
                        ColumnDef::new(SecureRoutes::RouteName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SecureRoutes::RoutePathGeojson).json().not_null())
                    .col(
                        ColumnDef::new(SecureRoutes::SecurityStatus)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SecureRoutes::RiskNotes).text())
                    .col(
                        ColumnDef::new(SecureRoutes::LastUpdated)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-secure_route-farmer_id")
                            .from(SecureRoutes::Table, SecureRoutes::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SecureRoutes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SecureRoutes {
    Table,
    Id,
    FarmerId,
    RouteName,
    RoutePathGeojson,
    SecurityStatus,
    RiskNotes,
    LastUpdated,
}
