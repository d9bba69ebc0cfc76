use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Farmers Table
        manager
            .create_table(
                Table::create()
                    .table(Farmers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Farmers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Farmers::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Farmers::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Farmers::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Farmers::FirstName)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Farmers::LastName)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Farmers::FarmName).string_len(200))
                    .col(ColumnDef::new(Farmers::PhoneNumber).string_len(20))
                    .col(ColumnDef::new(Farmers::CityOrRegion).string_len(100))
                    .col(ColumnDef::new(Farmers::ProfilePhoto).string())
                    .col(
                        ColumnDef::new(Farmers::VerificationStatus)
                            .string_len(20)
                            .not_null()
                            .default("unverified"),
                    )
                    .col(
                        ColumnDef::new(Farmers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Farmers::DateJoined).date_time().not_null())
                    .col(ColumnDef::new(Farmers::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Create Auth Tokens Table
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::Key)
                            .string_len(40)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::FarmerId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AuthTokens::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-auth_token-farmer_id")
                            .from(AuthTokens::Table, AuthTokens::FarmerId)
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
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Farmers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Farmers {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    FarmName,
    PhoneNumber,
    CityOrRegion,
    ProfilePhoto,
    VerificationStatus,
    IsActive,
    DateJoined,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Key,
    FarmerId,
    CreatedAt,
}
