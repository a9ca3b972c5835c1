use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl PageQuery {
    pub fn resolve(&self, default_limit: i64) -> AppResult<Page> {
        let limit = self.limit.unwrap_or(default_limit);
        let offset = self.offset.unwrap_or(0);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if offset < 0 {
            return Err(AppError::Validation("offset must be non-negative".into()));
        }
        Ok(Page { limit, offset })
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Paginated<T> {
    pub fn new((data, total): (Vec<T>, i64), page: Page) -> Self {
        Self {
            data,
            total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Slices an in-memory, already ordered collection.
pub fn paginate<T: Clone>(rows: &[T], page: Page) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let items = rows
        .iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    (items, total)
}
