use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use serde_json::Value;

use super::{non_blank, record_event};
use crate::auth::Actor;
use crate::entities::{prelude::SecurityStatus, secure_route};
use crate::error::AppError;
use crate::listing::{search_condition, ListParams};
use crate::scope::{find_owned, Scoped};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct RouteInput {
    pub route_name: String,
    /// A GeoJSON object, or the same object encoded as a JSON string.
    pub route_path_geojson: Value,
    pub security_status: SecurityStatus,
    #[serde(default)]
    pub risk_notes: Option<String>,
}

impl From<&secure_route::Model> for RouteInput {
    fn from(model: &secure_route::Model) -> Self {
        Self {
            route_name: model.route_name.clone(),
            route_path_geojson: model.route_path_geojson.clone(),
            security_status: model.security_status,
            risk_notes: model.risk_notes.clone(),
        }
    }
}

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Vec<secure_route::Model>, AppError> {
    let mut query = secure_route::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[secure_route::Column::RouteName, secure_route::Column::RiskNotes],
            term,
        ));
    }
    Ok(query
        .order_by_asc(secure_route::Column::RouteName)
        .all(db)
        .await?)
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<secure_route::Model, AppError> {
    find_owned::<secure_route::Entity>(db, actor.id, id).await
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: RouteInput,
) -> Result<secure_route::Model, AppError> {
    let path = validation::validate_route(&input)?;

    let new_route = secure_route::ActiveModel {
        farmer_id: Set(actor.id),
        route_name: Set(input.route_name.trim().to_string()),
        route_path_geojson: Set(path),
        security_status: Set(input.security_status),
        risk_notes: Set(non_blank(input.risk_notes)),
        last_updated: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let route = new_route.insert(db).await?;

    record_event("secure_routes", "create_secure_route", actor.id, "Secure route created");
    crate::metrics::increment_records_created("secure_routes");
    Ok(route)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: RouteInput,
) -> Result<secure_route::Model, AppError> {
    let existing = get(db, actor, id).await?;
    let path = validation::validate_route(&input)?;

    let mut active = existing.into_active_model();
    active.route_name = Set(input.route_name.trim().to_string());
    active.route_path_geojson = Set(path);
    active.security_status = Set(input.security_status);
    active.risk_notes = Set(non_blank(input.risk_notes));
    active.last_updated = Set(chrono::Utc::now().naive_utc());
    let route = active.update(db).await?;

    record_event("secure_routes", "update_secure_route", actor.id, "Secure route updated");
    Ok(route)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("secure_routes", "delete_secure_route", actor.id, "Secure route deleted");
    crate::metrics::increment_records_deleted("secure_routes");
    Ok(())
}
