use std::collections::HashMap;

use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Deserializer, Serialize};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::{prelude::WeatherSource, weather_record};
use crate::error::AppError;
use crate::listing::{ListParams, Page};
use crate::services::{
    self,
    weather::{self, WeatherInput},
};
use crate::validation;

#[derive(Serialize)]
pub struct WeatherListItem {
    pub id: i32,
    pub recorded_at: NaiveDateTime,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

impl From<weather_record::Model> for WeatherListItem {
    fn from(model: weather_record::Model) -> Self {
        Self {
            id: model.id,
            recorded_at: model.recorded_at,
            location: model.location,
            temperature: model.temperature,
            humidity: model.humidity,
            rainfall: model.rainfall,
        }
    }
}

#[derive(Serialize)]
pub struct WeatherDetail {
    pub id: i32,
    pub recorded_at: NaiveDateTime,
    pub field: Option<i32>,
    pub field_name: Option<String>,
    pub farmer_name: String,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub wind_speed: Option<f64>,
    pub source: WeatherSource,
}

impl WeatherDetail {
    fn new(model: weather_record::Model, fields: &HashMap<i32, String>, actor: &Actor) -> Self {
        Self {
            field_name: model.field_id.and_then(|id| fields.get(&id).cloned()),
            farmer_name: actor.username.clone(),
            id: model.id,
            recorded_at: model.recorded_at,
            field: model.field_id,
            location: model.location,
            temperature: model.temperature,
            humidity: model.humidity,
            rainfall: model.rainfall,
            wind_speed: model.wind_speed,
            source: model.source,
        }
    }
}

async fn detail(
    db: &DatabaseConnection,
    actor: &Actor,
    model: weather_record::Model,
) -> Result<WeatherDetail, AppError> {
    let fields = services::field_names(db, model.field_id.into_iter().collect()).await?;
    Ok(WeatherDetail::new(model, &fields, actor))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    validation::deserialize_timestamp(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct WeatherPatch {
    #[serde(default, deserialize_with = "optional_timestamp")]
    recorded_at: Option<NaiveDateTime>,
    #[serde(rename = "field", default, deserialize_with = "super::nullable")]
    field_id: Option<Option<i32>>,
    location: Option<String>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    rainfall: Option<f64>,
    #[serde(default, deserialize_with = "super::nullable")]
    wind_speed: Option<Option<f64>>,
    source: Option<WeatherSource>,
}

impl WeatherPatch {
    fn apply(self, base: WeatherInput) -> WeatherInput {
        WeatherInput {
            recorded_at: self.recorded_at.unwrap_or(base.recorded_at),
            field_id: self.field_id.unwrap_or(base.field_id),
            location: self.location.unwrap_or(base.location),
            temperature: self.temperature.unwrap_or(base.temperature),
            humidity: self.humidity.unwrap_or(base.humidity),
            rainfall: self.rainfall.unwrap_or(base.rainfall),
            wind_speed: self.wind_speed.unwrap_or(base.wind_speed),
            source: self.source.unwrap_or(base.source),
        }
    }
}

// GET /api/weather/?page=N - newest first, 25 per page
pub async fn list_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Page<WeatherListItem>>, AppError> {
    let page = weather::list(&db, &actor, &params).await?;
    Ok(Json(page.map(WeatherListItem::from)))
}

pub async fn create_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<WeatherInput>,
) -> Result<(StatusCode, Json<WeatherDetail>), AppError> {
    let record = weather::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(detail(&db, &actor, record).await?)))
}

pub async fn get_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<WeatherDetail>, AppError> {
    let record = weather::get(&db, &actor, id).await?;
    Ok(Json(detail(&db, &actor, record).await?))
}

pub async fn replace_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<WeatherInput>,
) -> Result<Json<WeatherDetail>, AppError> {
    let record = weather::update(&db, &actor, id, payload).await?;
    Ok(Json(detail(&db, &actor, record).await?))
}

pub async fn patch_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<WeatherPatch>,
) -> Result<Json<WeatherDetail>, AppError> {
    let existing = weather::get(&db, &actor, id).await?;
    let payload = patch.apply(WeatherInput::from(&existing));
    let record = weather::update(&db, &actor, id, payload).await?;
    Ok(Json(detail(&db, &actor, record).await?))
}

pub async fn delete_weather(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    weather::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
