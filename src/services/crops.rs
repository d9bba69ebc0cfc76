use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use super::record_event;
use crate::auth::Actor;
use crate::entities::{crop, field, prelude::CropStatus};
use crate::error::AppError;
use crate::listing::{search_condition, ListParams};
use crate::scope::{find_owned, Scoped};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct CropInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(rename = "fields", alias = "field")]
    pub field_id: i32,
    #[serde(default)]
    pub planted_on: Option<NaiveDate>,
    #[serde(default)]
    pub expected_harvest: Option<NaiveDate>,
    #[serde(default)]
    pub status: CropStatus,
}

impl From<&crop::Model> for CropInput {
    fn from(model: &crop::Model) -> Self {
        Self {
            name: model.name.clone(),
            description: model.description.clone(),
            category: model.category.clone(),
            field_id: model.field_id,
            planted_on: model.planted_on,
            expected_harvest: model.expected_harvest,
            status: model.status,
        }
    }
}

/// A crop paired with the field it grows in.
pub type CropWithField = (crop::Model, Option<field::Model>);

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Vec<CropWithField>, AppError> {
    let mut query = crop::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[
                crop::Column::Name,
                crop::Column::Category,
                crop::Column::Description,
            ],
            term,
        ));
    }
    Ok(query
        .order_by_asc(crop::Column::Status)
        .order_by_asc(crop::Column::ExpectedHarvest)
        .find_also_related(field::Entity)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<crop::Model, AppError> {
    find_owned::<crop::Entity>(db, actor.id, id).await
}

pub async fn get_with_field(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<CropWithField, AppError> {
    crop::Entity::owned_by_id(actor.id, id)
        .find_also_related(field::Entity)
        .one(db)
        .await?
        .ok_or(AppError::NotFound(crop::Entity::LABEL))
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CropInput,
) -> Result<crop::Model, AppError> {
    validation::validate_crop(db, actor.id, &input).await?;

    let new_crop = crop::ActiveModel {
        field_id: Set(input.field_id),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description),
        category: Set(input.category.trim().to_string()),
        status: Set(input.status),
        planted_on: Set(input.planted_on),
        expected_harvest: Set(input.expected_harvest),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let crop = new_crop.insert(db).await?;

    record_event("crops", "create_crop", actor.id, "Crop created");
    crate::metrics::increment_records_created("crops");
    Ok(crop)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: CropInput,
) -> Result<crop::Model, AppError> {
    let existing = get(db, actor, id).await?;
    validation::validate_crop(db, actor.id, &input).await?;

    let mut active = existing.into_active_model();
    active.field_id = Set(input.field_id);
    active.name = Set(input.name.trim().to_string());
    active.description = Set(input.description);
    active.category = Set(input.category.trim().to_string());
    active.status = Set(input.status);
    active.planted_on = Set(input.planted_on);
    active.expected_harvest = Set(input.expected_harvest);
    let crop = active.update(db).await?;

    record_event("crops", "update_crop", actor.id, "Crop updated");
    Ok(crop)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("crops", "delete_crop", actor.id, "Crop deleted");
    crate::metrics::increment_records_deleted("crops");
    Ok(())
}
