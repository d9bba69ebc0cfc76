use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use super::record_event;
use crate::auth::Actor;
use crate::entities::{activity, prelude::ActivityStatus};
use crate::error::AppError;
use crate::listing::{search_condition, ListParams};
use crate::scope::{find_owned, Scoped};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityInput {
    pub title: String,
    #[serde(default, rename = "field")]
    pub field_id: Option<i32>,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub estimated_harvest_date: Option<NaiveDate>,
    #[serde(default, rename = "crop")]
    pub crop_id: Option<i32>,
    #[serde(default)]
    pub description: String,
}

impl From<&activity::Model> for ActivityInput {
    fn from(model: &activity::Model) -> Self {
        Self {
            title: model.title.clone(),
            field_id: model.field_id,
            scheduled_date: model.scheduled_date,
            status: model.status,
            estimated_harvest_date: model.estimated_harvest_date,
            crop_id: model.crop_id,
            description: model.description.clone(),
        }
    }
}

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Vec<activity::Model>, AppError> {
    let mut query = activity::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[activity::Column::Title, activity::Column::Description],
            term,
        ));
    }
    if let Some(status) = params.status_filter() {
        query = query.filter(activity::Column::Status.eq(status));
    }
    Ok(query
        .order_by_asc(activity::Column::ScheduledDate)
        .order_by_asc(activity::Column::Id)
        .all(db)
        .await?)
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<activity::Model, AppError> {
    find_owned::<activity::Entity>(db, actor.id, id).await
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: ActivityInput,
) -> Result<activity::Model, AppError> {
    validation::validate_activity(db, actor.id, &input).await?;

    let new_activity = activity::ActiveModel {
        farmer_id: Set(actor.id),
        field_id: Set(input.field_id),
        crop_id: Set(input.crop_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        scheduled_date: Set(input.scheduled_date),
        estimated_harvest_date: Set(input.estimated_harvest_date),
        status: Set(input.status),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let activity = new_activity.insert(db).await?;

    record_event("activities", "create_activity", actor.id, "Activity scheduled");
    crate::metrics::increment_records_created("activities");
    Ok(activity)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: ActivityInput,
) -> Result<activity::Model, AppError> {
    let existing = get(db, actor, id).await?;
    validation::validate_activity(db, actor.id, &input).await?;

    let mut active = existing.into_active_model();
    active.field_id = Set(input.field_id);
    active.crop_id = Set(input.crop_id);
    active.title = Set(input.title.trim().to_string());
    active.description = Set(input.description);
    active.scheduled_date = Set(input.scheduled_date);
    active.estimated_harvest_date = Set(input.estimated_harvest_date);
    active.status = Set(input.status);
    let activity = active.update(db).await?;

    record_event("activities", "update_activity", actor.id, "Activity updated");
    Ok(activity)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("activities", "delete_activity", actor.id, "Activity deleted");
    crate::metrics::increment_records_deleted("activities");
    Ok(())
}
