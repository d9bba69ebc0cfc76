use chrono::{Duration, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use super::record_event;
use crate::auth::Actor;
use crate::entities::review;
use crate::error::AppError;
use crate::listing::{paginate, search_condition, ListParams, Page, REVIEW_PAGE_SIZE};
use crate::validation;

/// Minimum account age, and minimum gap between reviews.
pub const REVIEW_INTERVAL_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub content: String,
    pub rating: i32,
}

impl From<&review::Model> for ReviewInput {
    fn from(model: &review::Model) -> Self {
        Self {
            content: model.content.clone(),
            rating: model.rating,
        }
    }
}

/// True when the account is at least [`REVIEW_INTERVAL_DAYS`] old and the
/// newest review, if any, is older than that window.
pub fn is_eligible(
    date_joined: NaiveDateTime,
    last_review_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> bool {
    let cutoff = now - Duration::days(REVIEW_INTERVAL_DAYS);
    date_joined <= cutoff && last_review_at.map_or(true, |at| at < cutoff)
}

pub async fn can_review(
    db: &DatabaseConnection,
    actor: &Actor,
    now: NaiveDateTime,
) -> Result<bool, AppError> {
    // Young accounts never reach the query.
    if !is_eligible(actor.date_joined, None, now) {
        return Ok(false);
    }
    let latest = review::Entity::find()
        .filter(review::Column::FarmerId.eq(actor.id))
        .order_by_desc(review::Column::CreatedAt)
        .one(db)
        .await?;
    Ok(is_eligible(
        actor.date_joined,
        latest.map(|r| r.created_at),
        now,
    ))
}

pub async fn list(
    db: &DatabaseConnection,
    params: &ListParams,
) -> Result<Page<review::Model>, AppError> {
    let mut query = review::Entity::find();
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(&[review::Column::Content], term));
    }
    let query = query
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id);
    paginate(db, query, params.page(), REVIEW_PAGE_SIZE).await
}

pub async fn get(db: &DatabaseConnection, id: i32) -> Result<review::Model, AppError> {
    review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Review"))
}

async fn get_authored(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<review::Model, AppError> {
    let review = get(db, id).await?;
    if review.farmer_id != actor.id {
        return Err(AppError::Forbidden("You can only change your own reviews."));
    }
    Ok(review)
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: ReviewInput,
) -> Result<review::Model, AppError> {
    validation::validate_review(&input)?;

    let new_review = review::ActiveModel {
        farmer_id: Set(actor.id),
        content: Set(input.content.trim().to_string()),
        rating: Set(input.rating),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let review = new_review.insert(db).await?;

    record_event("reviews", "create_review", actor.id, "Review submitted");
    crate::metrics::increment_records_created("reviews");
    Ok(review)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: ReviewInput,
) -> Result<review::Model, AppError> {
    let existing = get_authored(db, actor, id).await?;
    validation::validate_review(&input)?;

    let mut active = existing.into_active_model();
    active.content = Set(input.content.trim().to_string());
    active.rating = Set(input.rating);
    let review = active.update(db).await?;

    record_event("reviews", "update_review", actor.id, "Review updated");
    Ok(review)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get_authored(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("reviews", "delete_review", actor.id, "Review deleted");
    crate::metrics::increment_records_deleted("reviews");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn young_account_is_not_eligible() {
        let now = at(2025, 6, 30);
        assert!(!is_eligible(at(2025, 6, 15), None, now));
    }

    #[test]
    fn old_account_without_reviews_is_eligible() {
        let now = at(2025, 6, 30);
        assert!(is_eligible(at(2025, 1, 1), None, now));
    }

    #[test]
    fn account_exactly_thirty_days_old_is_eligible() {
        let now = at(2025, 6, 30);
        assert!(is_eligible(now - Duration::days(30), None, now));
    }

    #[test]
    fn recent_review_blocks_until_window_passes() {
        let now = at(2025, 6, 30);
        let joined = at(2024, 1, 1);
        assert!(!is_eligible(joined, Some(at(2025, 6, 20)), now));
        assert!(is_eligible(joined, Some(at(2025, 5, 1)), now));
    }

    #[test]
    fn review_exactly_at_cutoff_still_blocks() {
        let now = at(2025, 6, 30);
        let joined = at(2024, 1, 1);
        assert!(!is_eligible(joined, Some(now - Duration::days(30)), now));
    }
}
