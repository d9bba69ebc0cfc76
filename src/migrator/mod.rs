use sea_orm_migration::prelude::*;

mod m20260301_000001_create_farmers;
mod m20260301_000002_create_fields_and_crops;
mod m20260305_000001_create_activities;
mod m20260305_000002_create_weather_records;
mod m20260310_000001_create_secure_routes;
mod m20260312_000001_create_social;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_farmers::Migration),
            Box::new(m20260301_000002_create_fields_and_crops::Migration),
            Box::new(m20260305_000001_create_activities::Migration),
            Box::new(m20260305_000002_create_weather_records::Migration),
            Box::new(m20260310_000001_create_secure_routes::Migration),
            Box::new(m20260312_000001_create_social::Migration),
        ]
    }
}
