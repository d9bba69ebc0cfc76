use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::{prelude::SecurityStatus, secure_route};
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::secure_routes::{self, RouteInput};

#[derive(Serialize)]
pub struct RouteListItem {
    pub id: i32,
    pub route_name: String,
    pub security_status: SecurityStatus,
}

impl From<secure_route::Model> for RouteListItem {
    fn from(model: secure_route::Model) -> Self {
        Self {
            id: model.id,
            route_name: model.route_name,
            security_status: model.security_status,
        }
    }
}

#[derive(Serialize)]
pub struct RouteDetail {
    pub id: i32,
    pub farmer_name: String,
    pub route_name: String,
    pub route_path_geojson: Value,
    pub security_status: SecurityStatus,
    pub risk_notes: Option<String>,
    pub last_updated: NaiveDateTime,
}

impl RouteDetail {
    fn new(model: secure_route::Model, actor: &Actor) -> Self {
        Self {
            id: model.id,
            farmer_name: actor.username.clone(),
            route_name: model.route_name,
            route_path_geojson: model.route_path_geojson,
            security_status: model.security_status,
            risk_notes: model.risk_notes,
            last_updated: model.last_updated,
        }
    }
}

#[derive(Deserialize)]
pub struct RoutePatch {
    route_name: Option<String>,
    route_path_geojson: Option<Value>,
    security_status: Option<SecurityStatus>,
    #[serde(default, deserialize_with = "super::nullable")]
    risk_notes: Option<Option<String>>,
}

impl RoutePatch {
    fn apply(self, base: RouteInput) -> RouteInput {
        RouteInput {
            route_name: self.route_name.unwrap_or(base.route_name),
            route_path_geojson: self.route_path_geojson.unwrap_or(base.route_path_geojson),
            security_status: self.security_status.unwrap_or(base.security_status),
            risk_notes: self.risk_notes.unwrap_or(base.risk_notes),
        }
    }
}

pub async fn list_routes(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<RouteListItem>>, AppError> {
    let routes = secure_routes::list(&db, &actor, &params).await?;
    Ok(Json(routes.into_iter().map(RouteListItem::from).collect()))
}

pub async fn create_route(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<RouteInput>,
) -> Result<(StatusCode, Json<RouteDetail>), AppError> {
    let route = secure_routes::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(RouteDetail::new(route, &actor))))
}

pub async fn get_route(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<RouteDetail>, AppError> {
    let route = secure_routes::get(&db, &actor, id).await?;
    Ok(Json(RouteDetail::new(route, &actor)))
}

pub async fn replace_route(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<RouteInput>,
) -> Result<Json<RouteDetail>, AppError> {
    let route = secure_routes::update(&db, &actor, id, payload).await?;
    Ok(Json(RouteDetail::new(route, &actor)))
}

pub async fn patch_route(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<RoutePatch>,
) -> Result<Json<RouteDetail>, AppError> {
    let existing = secure_routes::get(&db, &actor, id).await?;
    let payload = patch.apply(RouteInput::from(&existing));
    let route = secure_routes::update(&db, &actor, id, payload).await?;
    Ok(Json(RouteDetail::new(route, &actor)))
}

pub async fn delete_route(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    secure_routes::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
