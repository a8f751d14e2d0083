//! # Repository Module
//!
//! Database repository implementations for Stockbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.items().list(&filter)                                      │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── create / get_by_id / update / delete                              │
//! │  └── list / list_for_sale / filter_values                              │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL is isolated here; business math stays in stockbook-core.          │
//! │  Stock counters are NOT writable through repositories - the sale       │
//! │  engine owns them.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory CRUD, search and listings
//! - [`sale::SaleRepository`] - Sale reads and paginated listings
//! - [`user::UserRepository`] - Store and user onboarding
//! - [`insights::InsightsRepository`] - Sales/inventory aggregates

pub mod insights;
pub mod item;
pub mod sale;
pub mod user;

use serde::{Deserialize, Serialize};

/// Pagination metadata attached to every paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// 1-based page number that was fetched.
    pub page: u32,
    /// Requested page size.
    pub take: u32,
    /// Total matching records across all pages.
    pub total: i64,
    pub total_pages: u32,
    pub has_next_page: bool,
}

impl PageMeta {
    pub fn new(page: u32, take: u32, total: i64) -> Self {
        let take = take.max(1);
        let total_pages = ((total as f64) / (take as f64)).ceil() as u32;
        PageMeta {
            page,
            take,
            total,
            total_pages,
            has_next_page: page < total_pages,
        }
    }

    /// Rows to skip for this page.
    pub fn offset(page: u32, take: u32) -> i64 {
        (page.saturating_sub(1) as i64) * (take as i64)
    }
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_math() {
        let meta = PageMeta::new(1, 14, 30);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);

        let meta = PageMeta::new(3, 14, 30);
        assert!(!meta.has_next_page);

        let meta = PageMeta::new(1, 14, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageMeta::offset(1, 14), 0);
        assert_eq!(PageMeta::offset(2, 14), 14);
        assert_eq!(PageMeta::offset(0, 14), 0);
    }
}
