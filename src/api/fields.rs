use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::field;
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::fields::{self, FieldInput};

#[derive(Serialize)]
pub struct FieldListItem {
    pub id: i32,
    pub name: String,
    pub size_in_hectares: f64,
    pub soil_type: Option<String>,
}

impl From<field::Model> for FieldListItem {
    fn from(model: field::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            size_in_hectares: model.size_in_hectares,
            soil_type: model.soil_type,
        }
    }
}

#[derive(Serialize)]
pub struct FieldDetail {
    pub id: i32,
    pub farmer: String,
    pub name: String,
    pub location: Option<String>,
    pub size_in_hectares: f64,
    pub soil_type: Option<String>,
    pub created_at: NaiveDateTime,
}

impl FieldDetail {
    // Scoped reads only ever return the actor's own fields.
    fn new(model: field::Model, actor: &Actor) -> Self {
        Self {
            id: model.id,
            farmer: actor.username.clone(),
            name: model.name,
            location: model.location,
            size_in_hectares: model.size_in_hectares,
            soil_type: model.soil_type,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct FieldPatch {
    name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    location: Option<Option<String>>,
    size_in_hectares: Option<f64>,
    #[serde(default, deserialize_with = "super::nullable")]
    soil_type: Option<Option<String>>,
}

impl FieldPatch {
    fn apply(self, base: FieldInput) -> FieldInput {
        FieldInput {
            name: self.name.unwrap_or(base.name),
            location: self.location.unwrap_or(base.location),
            size_in_hectares: self.size_in_hectares.unwrap_or(base.size_in_hectares),
            soil_type: self.soil_type.unwrap_or(base.soil_type),
        }
    }
}

pub async fn list_fields(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<FieldListItem>>, AppError> {
    let fields = fields::list(&db, &actor, &params).await?;
    Ok(Json(fields.into_iter().map(FieldListItem::from).collect()))
}

pub async fn create_field(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<FieldInput>,
) -> Result<(StatusCode, Json<FieldDetail>), AppError> {
    let field = fields::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(FieldDetail::new(field, &actor))))
}

pub async fn get_field(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<FieldDetail>, AppError> {
    let field = fields::get(&db, &actor, id).await?;
    Ok(Json(FieldDetail::new(field, &actor)))
}

pub async fn replace_field(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<FieldInput>,
) -> Result<Json<FieldDetail>, AppError> {
    let field = fields::update(&db, &actor, id, payload).await?;
    Ok(Json(FieldDetail::new(field, &actor)))
}

pub async fn patch_field(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<FieldPatch>,
) -> Result<Json<FieldDetail>, AppError> {
    let existing = fields::get(&db, &actor, id).await?;
    let payload = patch.apply(FieldInput::from(&existing));
    let field = fields::update(&db, &actor, id, payload).await?;
    Ok(Json(FieldDetail::new(field, &actor)))
}

pub async fn delete_field(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    fields::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
