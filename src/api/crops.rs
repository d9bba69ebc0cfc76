use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::{crop, field, prelude::CropStatus};
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::crops::{self, CropInput};

fn field_name(field: Option<field::Model>) -> String {
    field.map(|f| f.name).unwrap_or_default()
}

#[derive(Serialize)]
pub struct CropListItem {
    pub id: i32,
    pub name: String,
    pub status: CropStatus,
    pub expected_harvest: Option<NaiveDate>,
    pub field_name: String,
}

impl From<(crop::Model, Option<field::Model>)> for CropListItem {
    fn from((model, field): (crop::Model, Option<field::Model>)) -> Self {
        Self {
            id: model.id,
            name: model.name,
            status: model.status,
            expected_harvest: model.expected_harvest,
            field_name: field_name(field),
        }
    }
}

#[derive(Serialize)]
pub struct CropDetail {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub status: CropStatus,
    pub planted_on: Option<NaiveDate>,
    pub expected_harvest: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub field_id: i32,
    /// Name of the field the crop grows in.
    pub fields: String,
}

impl From<(crop::Model, Option<field::Model>)> for CropDetail {
    fn from((model, field): (crop::Model, Option<field::Model>)) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            status: model.status,
            planted_on: model.planted_on,
            expected_harvest: model.expected_harvest,
            created_at: model.created_at,
            field_id: model.field_id,
            fields: field_name(field),
        }
    }
}

#[derive(Deserialize)]
pub struct CropPatch {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[serde(rename = "fields", alias = "field")]
    field_id: Option<i32>,
    #[serde(default, deserialize_with = "super::nullable")]
    planted_on: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    expected_harvest: Option<Option<NaiveDate>>,
    status: Option<CropStatus>,
}

impl CropPatch {
    fn apply(self, base: CropInput) -> CropInput {
        CropInput {
            name: self.name.unwrap_or(base.name),
            description: self.description.unwrap_or(base.description),
            category: self.category.unwrap_or(base.category),
            field_id: self.field_id.unwrap_or(base.field_id),
            planted_on: self.planted_on.unwrap_or(base.planted_on),
            expected_harvest: self.expected_harvest.unwrap_or(base.expected_harvest),
            status: self.status.unwrap_or(base.status),
        }
    }
}

pub async fn list_crops(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<CropListItem>>, AppError> {
    let crops = crops::list(&db, &actor, &params).await?;
    Ok(Json(crops.into_iter().map(CropListItem::from).collect()))
}

pub async fn create_crop(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<CropInput>,
) -> Result<(StatusCode, Json<CropDetail>), AppError> {
    let crop = crops::create(&db, &actor, payload).await?;
    let detail = crops::get_with_field(&db, &actor, crop.id).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

pub async fn get_crop(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CropDetail>, AppError> {
    let detail = crops::get_with_field(&db, &actor, id).await?;
    Ok(Json(detail.into()))
}

pub async fn replace_crop(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CropInput>,
) -> Result<Json<CropDetail>, AppError> {
    crops::update(&db, &actor, id, payload).await?;
    let detail = crops::get_with_field(&db, &actor, id).await?;
    Ok(Json(detail.into()))
}

pub async fn patch_crop(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<CropPatch>,
) -> Result<Json<CropDetail>, AppError> {
    let existing = crops::get(&db, &actor, id).await?;
    let payload = patch.apply(CropInput::from(&existing));
    crops::update(&db, &actor, id, payload).await?;
    let detail = crops::get_with_field(&db, &actor, id).await?;
    Ok(Json(detail.into()))
}

pub async fn delete_crop(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    crops::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
