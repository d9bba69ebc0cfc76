//! Query-string driven list helpers: text search and page slicing.

use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, Select,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const WEATHER_PAGE_SIZE: u64 = 25;
pub const REVIEW_PAGE_SIZE: u64 = 10;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// `None` for a missing filter and for the "all" sentinel used by the pages.
    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty() && *status != "all")
    }
}

/// Case-insensitive substring match over any of `columns`.
pub fn search_condition<C: ColumnTrait>(columns: &[C], term: &str) -> Condition {
    let pattern = format!("%{}%", term.to_lowercase());
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::lower(Expr::col(column.as_column_ref()))).like(pattern.clone()),
        )
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            num_pages: self.num_pages,
            previous_page: self.previous_page,
            next_page: self.next_page,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Fetches 1-based `page` of `select`. An out-of-range page is NotFound;
/// an empty result set still has one (empty) page.
pub async fn paginate<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<Page<E::Model>, AppError>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let paginator = select.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let num_pages = totals.number_of_pages.max(1);
    let page = page.max(1);
    if page > num_pages {
        return Err(AppError::NotFound("Page"));
    }

    let results = paginator.fetch_page(page - 1).await?;
    Ok(Page {
        count: totals.number_of_items,
        page,
        num_pages,
        previous_page: (page > 1).then(|| page - 1),
        next_page: (page < num_pages).then(|| page + 1),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        let params = ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_term(), None);
    }

    #[test]
    fn all_status_means_no_filter() {
        let params = ListParams {
            status: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(params.status_filter(), None);

        let params = ListParams {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        assert_eq!(params.status_filter(), Some("completed"));
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(ListParams::default().page(), 1);
        let params = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
    }
}
