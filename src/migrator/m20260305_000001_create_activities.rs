use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_farmers::Farmers;
use super::m20260301_000002_create_fields_and_crops::{Crops, Fields};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activities::FarmerId).integer().not_null())
                    .col(ColumnDef::new(Activities::FieldId).integer())
                    .col(ColumnDef::new(Activities::CropId).integer())
                    .col(ColumnDef::new(Activities::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Activities::Description).text().not_null())
                    .col(ColumnDef::new(Activities::ScheduledDate).date().not_null())
                    .col(ColumnDef::new(Activities::EstimatedHarvestDate).date())
                    .col(
                        ColumnDef::new(Activities::Status)
                            .string_len(20)
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(ColumnDef::new(Activities::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-farmer_id")
                            .from(Activities::Table, Activities::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-field_id")
                            .from(Activities::Table, Activities::FieldId)
                            .to(Fields::Table, Fields::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-crop_id")
                            .from(Activities::Table, Activities::CropId)
                            .to(Crops::Table, Crops::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activities_farmer_scheduled")
                    .table(Activities::Table)
                    .col(Activities::FarmerId)
                    .col(Activities::ScheduledDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Activities {
    Table,
    Id,
    FarmerId,
    FieldId,
    CropId,
    Title,
    Description,
    ScheduledDate,
    EstimatedHarvestDate,
    Status,
    CreatedAt,
}
