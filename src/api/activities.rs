use std::collections::HashMap;

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
use crate::entities::{activity, prelude::ActivityStatus};
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::{
    self,
    activities::{self, ActivityInput},
};

struct Names {
    fields: HashMap<i32, String>,
    crops: HashMap<i32, String>,
}

impl Names {
    async fn load(db: &DatabaseConnection, rows: &[activity::Model]) -> Result<Self, AppError> {
        Ok(Self {
            fields: services::field_names(db, rows.iter().filter_map(|a| a.field_id).collect()).await?,
            crops: services::crop_names(db, rows.iter().filter_map(|a| a.crop_id).collect()).await?,
        })
    }

    fn field(&self, id: Option<i32>) -> Option<String> {
        id.and_then(|id| self.fields.get(&id).cloned())
    }

    fn crop(&self, id: Option<i32>) -> Option<String> {
        id.and_then(|id| self.crops.get(&id).cloned())
    }
}

#[derive(Serialize)]
pub struct ActivityListItem {
    pub id: i32,
    pub title: String,
    pub field_name: Option<String>,
    pub scheduled_date: NaiveDate,
    pub status: ActivityStatus,
}

#[derive(Serialize)]
pub struct ActivityDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub field: Option<i32>,
    pub crop: Option<i32>,
    pub scheduled_date: NaiveDate,
    pub estimated_harvest_date: Option<NaiveDate>,
    pub status: ActivityStatus,
    pub created_at: NaiveDateTime,
    pub farmer_name: String,
    pub field_name: Option<String>,
    pub crop_name: Option<String>,
}

impl ActivityDetail {
    fn new(model: activity::Model, names: &Names, actor: &Actor) -> Self {
        Self {
            field_name: names.field(model.field_id),
            crop_name: names.crop(model.crop_id),
            farmer_name: actor.username.clone(),
            id: model.id,
            title: model.title,
            description: model.description,
            field: model.field_id,
            crop: model.crop_id,
            scheduled_date: model.scheduled_date,
            estimated_harvest_date: model.estimated_harvest_date,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

async fn detail(
    db: &DatabaseConnection,
    actor: &Actor,
    model: activity::Model,
) -> Result<ActivityDetail, AppError> {
    let names = Names::load(db, std::slice::from_ref(&model)).await?;
    Ok(ActivityDetail::new(model, &names, actor))
}

#[derive(Deserialize)]
pub struct ActivityPatch {
    title: Option<String>,
    #[serde(rename = "field", default, deserialize_with = "super::nullable")]
    field_id: Option<Option<i32>>,
    scheduled_date: Option<NaiveDate>,
    status: Option<ActivityStatus>,
    #[serde(default, deserialize_with = "super::nullable")]
    estimated_harvest_date: Option<Option<NaiveDate>>,
    #[serde(rename = "crop", default, deserialize_with = "super::nullable")]
    crop_id: Option<Option<i32>>,
    description: Option<String>,
}

impl ActivityPatch {
    fn apply(self, base: ActivityInput) -> ActivityInput {
        ActivityInput {
            title: self.title.unwrap_or(base.title),
            field_id: self.field_id.unwrap_or(base.field_id),
            scheduled_date: self.scheduled_date.unwrap_or(base.scheduled_date),
            status: self.status.unwrap_or(base.status),
            estimated_harvest_date: self.estimated_harvest_date.unwrap_or(base.estimated_harvest_date),
            crop_id: self.crop_id.unwrap_or(base.crop_id),
            description: self.description.unwrap_or(base.description),
        }
    }
}

// GET /api/activities/?search=&status=
pub async fn list_activities(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<ActivityListItem>>, AppError> {
    let rows = activities::list(&db, &actor, &params).await?;
    let names = Names::load(&db, &rows).await?;
    let items = rows
        .into_iter()
        .map(|model| ActivityListItem {
            field_name: names.field(model.field_id),
            id: model.id,
            title: model.title,
            scheduled_date: model.scheduled_date,
            status: model.status,
        })
        .collect();
    Ok(Json(items))
}

pub async fn create_activity(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<ActivityInput>,
) -> Result<(StatusCode, Json<ActivityDetail>), AppError> {
    let activity = activities::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(detail(&db, &actor, activity).await?)))
}

pub async fn get_activity(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ActivityDetail>, AppError> {
    let activity = activities::get(&db, &actor, id).await?;
    Ok(Json(detail(&db, &actor, activity).await?))
}

pub async fn replace_activity(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ActivityInput>,
) -> Result<Json<ActivityDetail>, AppError> {
    let activity = activities::update(&db, &actor, id, payload).await?;
    Ok(Json(detail(&db, &actor, activity).await?))
}

pub async fn patch_activity(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<ActivityPatch>,
) -> Result<Json<ActivityDetail>, AppError> {
    let existing = activities::get(&db, &actor, id).await?;
    let payload = patch.apply(ActivityInput::from(&existing));
    let activity = activities::update(&db, &actor, id, payload).await?;
    Ok(Json(detail(&db, &actor, activity).await?))
}

pub async fn delete_activity(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    activities::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
