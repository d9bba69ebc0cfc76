use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use crate::entities::{crop, farmer, field};

pub async fn init_metrics(db: &DatabaseConnection) {
    let (farmer_count, field_count, crop_count) = refresh_totals(db).await;
    tracing::info!(
        "Initialized metrics: Farmers={}, Fields={}, Crops={}",
        farmer_count, field_count, crop_count
    );
}

/// Re-counts the total gauges. Deletes that cascade call this instead of a
/// single decrement.
pub async fn refresh_totals(db: &DatabaseConnection) -> (u64, u64, u64) {
    let farmer_count = farmer::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("agri_farmers_total").set(farmer_count as f64);

    let field_count = field::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("agri_fields_total").set(field_count as f64);

    let crop_count = crop::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("agri_crops_total").set(crop_count as f64);

    (farmer_count, field_count, crop_count)
}

pub fn increment_farmers_registered() {
    metrics::counter!("agri_farmers_registered_total").increment(1);
    metrics::gauge!("agri_farmers_total").increment(1.0);
}

pub fn increment_records_created(table: &'static str) {
    metrics::counter!("agri_records_created_total", "table" => table).increment(1);
    match table {
        "fields" => metrics::gauge!("agri_fields_total").increment(1.0),
        "crops" => metrics::gauge!("agri_crops_total").increment(1.0),
        _ => {}
    }
}

pub fn increment_records_deleted(table: &'static str) {
    metrics::counter!("agri_records_deleted_total", "table" => table).increment(1);
    if table == "crops" {
        metrics::gauge!("agri_crops_total").decrement(1.0);
    }
}

pub fn increment_validation_rejections(table: &'static str) {
    metrics::counter!("agri_validation_rejections_total", "table" => table).increment(1);
}
