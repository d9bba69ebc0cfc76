use std::collections::HashMap;

use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::review;
use crate::error::AppError;
use crate::listing::{ListParams, Page};
use crate::services::{
    self,
    reviews::{self, ReviewInput},
};

#[derive(Serialize)]
pub struct ReviewItem {
    pub id: i32,
    pub farmer: i32,
    pub farmer_name: String,
    pub content: String,
    pub rating: i32,
    pub created_at: NaiveDateTime,
}

impl ReviewItem {
    fn new(model: review::Model, names: &HashMap<i32, String>) -> Self {
        Self {
            farmer_name: names.get(&model.farmer_id).cloned().unwrap_or_default(),
            id: model.id,
            farmer: model.farmer_id,
            content: model.content,
            rating: model.rating,
            created_at: model.created_at,
        }
    }
}

async fn item(db: &DatabaseConnection, model: review::Model) -> Result<ReviewItem, AppError> {
    let names = services::usernames(db, vec![model.farmer_id]).await?;
    Ok(ReviewItem::new(model, &names))
}

#[derive(Deserialize)]
pub struct ReviewPatch {
    content: Option<String>,
    rating: Option<i32>,
}

impl ReviewPatch {
    fn apply(self, base: ReviewInput) -> ReviewInput {
        ReviewInput {
            content: self.content.unwrap_or(base.content),
            rating: self.rating.unwrap_or(base.rating),
        }
    }
}

// GET /api/reviews/?page=N - all farmers' reviews, newest first
pub async fn list_reviews(
    Extension(db): Extension<DatabaseConnection>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Page<ReviewItem>>, AppError> {
    let page = reviews::list(&db, &params).await?;
    let names = services::usernames(&db, page.results.iter().map(|r| r.farmer_id).collect()).await?;
    Ok(Json(page.map(|model| ReviewItem::new(model, &names))))
}

// GET /api/reviews/eligibility/
pub async fn eligibility(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let show = reviews::can_review(&db, &actor, chrono::Utc::now().naive_utc()).await?;
    Ok(Json(json!({"show_review_modal": show})))
}

pub async fn create_review(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<ReviewItem>), AppError> {
    let review = reviews::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(item(&db, review).await?)))
}

pub async fn get_review(
    Extension(db): Extension<DatabaseConnection>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ReviewItem>, AppError> {
    let review = reviews::get(&db, id).await?;
    Ok(Json(item(&db, review).await?))
}

pub async fn replace_review(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ReviewInput>,
) -> Result<Json<ReviewItem>, AppError> {
    let review = reviews::update(&db, &actor, id, payload).await?;
    Ok(Json(item(&db, review).await?))
}

pub async fn patch_review(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<ReviewPatch>,
) -> Result<Json<ReviewItem>, AppError> {
    let existing = reviews::get(&db, id).await?;
    let payload = patch.apply(ReviewInput::from(&existing));
    let review = reviews::update(&db, &actor, id, payload).await?;
    Ok(Json(item(&db, review).await?))
}

pub async fn delete_review(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    reviews::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
