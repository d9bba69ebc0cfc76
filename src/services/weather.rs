use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;

use super::record_event;
use crate::auth::Actor;
use crate::entities::{prelude::WeatherSource, weather_record};
use crate::error::AppError;
use crate::listing::{paginate, search_condition, ListParams, Page, WEATHER_PAGE_SIZE};
use crate::scope::{find_owned, Scoped};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherInput {
    #[serde(deserialize_with = "validation::deserialize_timestamp")]
    pub recorded_at: NaiveDateTime,
    #[serde(default, rename = "field")]
    pub field_id: Option<i32>,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub source: WeatherSource,
}

impl From<&weather_record::Model> for WeatherInput {
    fn from(model: &weather_record::Model) -> Self {
        Self {
            recorded_at: model.recorded_at,
            field_id: model.field_id,
            location: model.location.clone(),
            temperature: model.temperature,
            humidity: model.humidity,
            rainfall: model.rainfall,
            wind_speed: model.wind_speed,
            source: model.source,
        }
    }
}

/// Newest readings first, [`WEATHER_PAGE_SIZE`] per page.
pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Page<weather_record::Model>, AppError> {
    let mut query = weather_record::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(&[weather_record::Column::Location], term));
    }
    let query = query
        .order_by_desc(weather_record::Column::RecordedAt)
        .order_by_desc(weather_record::Column::Id);
    paginate(db, query, params.page(), WEATHER_PAGE_SIZE).await
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<weather_record::Model, AppError> {
    find_owned::<weather_record::Entity>(db, actor.id, id).await
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: WeatherInput,
) -> Result<weather_record::Model, AppError> {
    validation::validate_weather(db, actor.id, &input, None).await?;

    let new_record = weather_record::ActiveModel {
        farmer_id: Set(actor.id),
        field_id: Set(input.field_id),
        recorded_at: Set(input.recorded_at),
        location: Set(input.location.trim().to_string()),
        temperature: Set(input.temperature),
        humidity: Set(input.humidity),
        rainfall: Set(input.rainfall),
        wind_speed: Set(input.wind_speed),
        source: Set(input.source),
        ..Default::default()
    };
    let record = new_record.insert(db).await?;

    record_event("weather_records", "create_weather_record", actor.id, "Weather recorded");
    crate::metrics::increment_records_created("weather_records");
    Ok(record)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: WeatherInput,
) -> Result<weather_record::Model, AppError> {
    let existing = get(db, actor, id).await?;
    validation::validate_weather(db, actor.id, &input, Some(existing.id)).await?;

    let mut active = existing.into_active_model();
    active.field_id = Set(input.field_id);
    active.recorded_at = Set(input.recorded_at);
    active.location = Set(input.location.trim().to_string());
    active.temperature = Set(input.temperature);
    active.humidity = Set(input.humidity);
    active.rainfall = Set(input.rainfall);
    active.wind_speed = Set(input.wind_speed);
    active.source = Set(input.source);
    let record = active.update(db).await?;

    record_event("weather_records", "update_weather_record", actor.id, "Weather record updated");
    Ok(record)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("weather_records", "delete_weather_record", actor.id, "Weather record deleted");
    crate::metrics::increment_records_deleted("weather_records");
    Ok(())
}
