use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;

use super::{non_blank, record_event};
use crate::auth::Actor;
use crate::entities::field;
use crate::error::AppError;
use crate::listing::{search_condition, ListParams};
use crate::scope::{find_owned, Scoped};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct FieldInput {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub size_in_hectares: f64,
    #[serde(default)]
    pub soil_type: Option<String>,
}

impl From<&field::Model> for FieldInput {
    fn from(model: &field::Model) -> Self {
        Self {
            name: model.name.clone(),
            location: model.location.clone(),
            size_in_hectares: model.size_in_hectares,
            soil_type: model.soil_type.clone(),
        }
    }
}

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Vec<field::Model>, AppError> {
    let mut query = field::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[
                field::Column::Name,
                field::Column::Location,
                field::Column::SoilType,
            ],
            term,
        ));
    }
    Ok(query.order_by_asc(field::Column::Name).all(db).await?)
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<field::Model, AppError> {
    find_owned::<field::Entity>(db, actor.id, id).await
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: FieldInput,
) -> Result<field::Model, AppError> {
    validation::validate_field(&input)?;

    let new_field = field::ActiveModel {
        farmer_id: Set(actor.id),
        name: Set(input.name.trim().to_string()),
        location: Set(non_blank(input.location)),
        size_in_hectares: Set(input.size_in_hectares),
        soil_type: Set(non_blank(input.soil_type)),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let field = new_field.insert(db).await?;

    record_event("fields", "create_field", actor.id, "Field created");
    crate::metrics::increment_records_created("fields");
    Ok(field)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: FieldInput,
) -> Result<field::Model, AppError> {
    let existing = get(db, actor, id).await?;
    validation::validate_field(&input)?;

    let mut active = existing.into_active_model();
    active.name = Set(input.name.trim().to_string());
    active.location = Set(non_blank(input.location));
    active.size_in_hectares = Set(input.size_in_hectares);
    active.soil_type = Set(non_blank(input.soil_type));
    let field = active.update(db).await?;

    record_event("fields", "update_field", actor.id, "Field updated");
    Ok(field)
}

/// Crops go with the field; activities and weather records keep their rows
/// with the field reference cleared.
pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("fields", "delete_field", actor.id, "Field deleted");
    crate::metrics::increment_records_deleted("fields");
    crate::metrics::refresh_totals(db).await;
    Ok(())
}
