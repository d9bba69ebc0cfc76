use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_farmers::Farmers;
use super::m20260301_000002_create_fields_and_crops::Fields;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeatherRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeatherRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeatherRecords::FarmerId).integer().not_null())
                    .col(ColumnDef::new(WeatherRecords::FieldId).integer())
                    .col(
                        ColumnDef::new(WeatherRecords::RecordedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherRecords::Location)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeatherRecords::Temperature).double().not_null())
                    .col(ColumnDef::new(WeatherRecords::Humidity).double().not_null())
                    .col(ColumnDef::new(WeatherRecords::Rainfall).double().not_null())
                    .col(ColumnDef::new(WeatherRecords::WindSpeed).double())
                    .col(
                        ColumnDef::new(WeatherRecords::Source)
                            .string_len(10)
                            .not_null()
                            .default("manual"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-weather_record-farmer_id")
                            .from(WeatherRecords::Table, WeatherRecords::FarmerId)
                            .to(Farmers::Table, Farmers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-weather_record-field_id")
                            .from(WeatherRecords::Table, WeatherRecords::FieldId)
                            .to(Fields::Table, Fields::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reading per field per instant
        manager
            .create_index(
                Index::create()
                    .name("idx_weather_records_field_recorded_at")
                    .table(WeatherRecords::Table)
                    .col(WeatherRecords::FieldId)
                    .col(WeatherRecords::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weather_records_farmer_id")
                    .table(WeatherRecords::Table)
                    .col(WeatherRecords::FarmerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeatherRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeatherRecords {
    Table,
    Id,
    FarmerId,
    FieldId,
    RecordedAt,
    Location,
    Temperature,
    Humidity,
    Rainfall,
    WindSpeed,
    Source,
}
