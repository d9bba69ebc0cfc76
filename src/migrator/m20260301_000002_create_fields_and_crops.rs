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
                    .table(Fields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fields::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fields::FarmerId).integer().not_null())
                    .col(ColumnDef::new(Fields::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Fields::Location).string_len(255))
                    .col(ColumnDef::new(Fields::SizeInHectares).double().not_null())
                    .col(ColumnDef::new(Fields::SoilType).string_len(50))
                    .col(ColumnDef::new(Fields::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-field-farmer_id")
                            .from(Fields::Table, Fields::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fields_farmer_id")
                    .table(Fields::Table)
                    .col(Fields::FarmerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Crops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Crops::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Crops::FieldId).integer().not_null())
                    .col(ColumnDef::new(Crops::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Crops::Description).text().not_null())
                    .col(ColumnDef::new(Crops::Category).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Crops::Status)
                            .string_len(20)
                            .not_null()
                            .default("planted"),
                    )
                    .col(ColumnDef::new(Crops::PlantedOn).date())
                    .col(ColumnDef::new(Crops::ExpectedHarvest).date())
                    .col(ColumnDef::new(Crops::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-crop-field_id")
                            .from(Crops::Table, Crops::FieldId)
                            .to(Fields::Table, Fields::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crops_field_id")
                    .table(Crops::Table)
                    .col(Crops::FieldId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Crops::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fields::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Fields {
    Table,
    Id,
    FarmerId,
    Name,
    Location,
    SizeInHectares,
    SoilType,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Crops {
    Table,
    Id,
    FieldId,
    Name,
    Description,
    Category,
    Status,
    PlantedOn,
    ExpectedHarvest,
    CreatedAt,
}
