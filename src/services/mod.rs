//! Entity operations shared by the JSON API and the HTML pages.
//!
//! Every function takes the acting farmer and resolves rows through
//! [`crate::scope::Scoped`], so callers never see another farmer's data.

pub mod activities;
pub mod crops;
pub mod farmers;
pub mod fields;
pub mod posts;
pub mod reviews;
pub mod secure_routes;
pub mod weather;

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::entities::{crop, farmer, field};

/// Fills the request span fields that the trace layer leaves empty.
pub(crate) fn record_event(table: &'static str, action: &'static str, farmer_id: i32, event: &str) {
    tracing::Span::current()
        .record("table", table)
        .record("action", action)
        .record("farmer_id", farmer_id)
        .record("business_event", event);
}

/// Trims optional text, mapping blank input to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dedup(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn usernames(
    db: &DatabaseConnection,
    ids: Vec<i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = farmer::Entity::find()
        .filter(farmer::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|f| (f.id, f.username)).collect())
}

pub async fn field_names(
    db: &DatabaseConnection,
    ids: Vec<i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = field::Entity::find()
        .filter(field::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|f| (f.id, f.name)).collect())
}

pub async fn crop_names(
    db: &DatabaseConnection,
    ids: Vec<i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = crop::Entity::find()
        .filter(crop::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|c| (c.id, c.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" Loam ".to_string())), Some("Loam".to_string()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn dedup_sorts_and_removes_repeats() {
        assert_eq!(dedup(vec![3, 1, 3, 2, 1]), vec![1, 2, 3]);
    }
}
