//! Pagination built around a fixed page size.
//!
//! A listing never 404s on a bad page number. Whatever arrives in the query
//! string resolves to a real page: garbage falls back to 1 and out-of-range
//! numbers clamp to the nearest existing page.

use serde::Serialize;

/// One page of a listing plus the numbers the paginator widget renders.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_number: i64,
    pub next_number: i64,
}

/// Turns raw page-number input and row counts into fetch windows.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: i64,
}

impl Paginator {
    pub fn new(per_page: i64) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Number of pages a listing of `total_count` rows spans. An empty
    /// listing still has one page.
    pub fn total_pages(&self, total_count: i64) -> i64 {
        if total_count <= 0 {
            return 1;
        }
        (total_count + self.per_page - 1) / self.per_page
    }

    /// Clamps a requested page number into `1..=total_pages`.
    pub fn clamp(&self, requested: i64, total_pages: i64) -> i64 {
        requested.clamp(1, total_pages.max(1))
    }

    /// Row offset of a (clamped) page number.
    pub fn offset(&self, page: i64) -> i64 {
        (page - 1) * self.per_page
    }

    /// Assembles a [`Page`] from already-fetched items.
    pub fn page<T>(&self, items: Vec<T>, number: i64, total_count: i64) -> Page<T> {
        let total_pages = self.total_pages(total_count);
        let number = self.clamp(number, total_pages);
        Page {
            items,
            number,
            total_pages,
            total_count,
            has_previous: number > 1,
            has_next: number < total_pages,
            previous_number: (number - 1).max(1),
            next_number: (number + 1).min(total_pages),
        }
    }
}

/// Parses the `page` query parameter. Missing or non-numeric input reads
/// as page 1; range handling is left to [`Paginator::clamp`].
pub fn parse_page_param(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}
