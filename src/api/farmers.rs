use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::farmer;
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::farmers::{self, ProfileInput, RegistrationInput};

#[derive(Serialize)]
pub struct FarmerListItem {
    pub id: i32,
    pub username: String,
    pub farm_name: Option<String>,
    pub city_or_region: Option<String>,
}

impl From<farmer::Model> for FarmerListItem {
    fn from(model: farmer::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            farm_name: model.farm_name,
            city_or_region: model.city_or_region,
        }
    }
}

#[derive(Serialize)]
pub struct FarmerDetail {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub farm_name: Option<String>,
    pub phone_number: Option<String>,
    pub city_or_region: Option<String>,
    pub profile_photo: Option<String>,
    pub verification_status: farmer::VerificationStatus,
    pub group: &'static str,
    pub date_joined: NaiveDateTime,
}

impl From<farmer::Model> for FarmerDetail {
    fn from(model: farmer::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            farm_name: model.farm_name,
            phone_number: model.phone_number,
            city_or_region: model.city_or_region,
            profile_photo: model.profile_photo,
            group: model.verification_status.group_name(),
            verification_status: model.verification_status,
            date_joined: model.date_joined,
        }
    }
}

// GET /api/farmers/ - the caller's own record, empty when anonymous
pub async fn list_farmers(
    Extension(db): Extension<DatabaseConnection>,
    actor: Option<Extension<Actor>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<FarmerListItem>>, AppError> {
    let actor = actor.map(|Extension(actor)| actor);
    let farmers = farmers::list(&db, actor.as_ref(), &params).await?;
    Ok(Json(farmers.into_iter().map(FarmerListItem::from).collect()))
}

// POST /api/farmers/ - self-registration
pub async fn register_farmer(
    Extension(db): Extension<DatabaseConnection>,
    ApiJson(payload): ApiJson<RegistrationInput>,
) -> Result<(StatusCode, Json<FarmerDetail>), AppError> {
    let farmer = farmers::register(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(farmer.into())))
}

pub async fn get_farmer(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<FarmerDetail>, AppError> {
    let farmer = farmers::get(&db, &actor, id).await?;
    Ok(Json(farmer.into()))
}

// PUT and PATCH /api/farmers/:id/ - every profile column is optional
pub async fn update_farmer(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ProfileInput>,
) -> Result<Json<FarmerDetail>, AppError> {
    let farmer = farmers::update_profile(&db, &actor, id, payload).await?;
    Ok(Json(farmer.into()))
}

pub async fn delete_farmer(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    farmers::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
