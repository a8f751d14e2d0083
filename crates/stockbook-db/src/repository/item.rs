//! # Item Repository
//!
//! Database operations for inventory items.
//!
//! ## Key Operations
//! - CRUD with per-store sequential item numbers
//! - Free-text search + type/department filters with pagination
//! - Lightweight listing for the sale screen
//!
//! ## What Is Deliberately Missing
//! Nothing here writes `qty_available` or `reserved_qty` from an absolute
//! value. The sale engine owns those counters; the only stock mutation
//! exposed on this repository is [`ItemRepository::restock`], a relative
//! adjustment for goods-received flows.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{Page, PageMeta};
use stockbook_core::numbering::next_in_sequence;
use stockbook_core::{Item, DEFAULT_PAGE_SIZE};

/// Input for creating an inventory item. Stock starts at
/// `qty_available` with nothing reserved.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub store_id: String,
    pub item_type: String,
    pub department: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_size: Option<String>,
    pub unit_type: Option<String>,
    #[serde(default)]
    pub qty_available: i64,
    pub low_stock_alert_qty: Option<i64>,
    pub selling_price_cents: i64,
    pub cost_price_cents: Option<i64>,
}

/// Search/filter parameters for [`ItemRepository::list`].
///
/// `search` matches the item number, department, name, description and
/// unit fields, case-insensitively. `page` is 1-based; zero values fall
/// back to page 1 / the default page size.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    pub store_id: String,
    pub search: Option<String>,
    pub item_type: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub take: u32,
}

/// Trimmed item projection for the sale screen.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemSummary {
    pub id: String,
    pub item_number: String,
    pub name: String,
    pub unit_size: Option<String>,
    pub unit_type: Option<String>,
    pub qty_available: i64,
    pub selling_price_cents: i64,
}

/// One distinct (type, department) pair a store's items fall under; feeds
/// the filter dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ItemFilterValue {
    pub item_type: String,
    pub department: String,
}

/// Repository for inventory item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Creates a new item, assigning the next item number for the store.
    ///
    /// Refuses an item whose defining fields (type, department, name,
    /// unit size/type) duplicate an existing item of the same store.
    pub async fn create(&self, new: NewItem) -> DbResult<Item> {
        if let Some(existing) = self.find_existing(&new).await? {
            return Err(DbError::duplicate("item", existing.name));
        }

        let last: Option<String> =
            sqlx::query_scalar("SELECT MAX(item_number) FROM items WHERE store_id = ?1")
                .bind(&new.store_id)
                .fetch_one(&self.pool)
                .await?;
        let item_number = next_in_sequence(last.as_deref());

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            store_id: new.store_id,
            item_number,
            item_type: new.item_type,
            department: new.department,
            name: new.name,
            description: new.description,
            unit_size: new.unit_size,
            unit_type: new.unit_type,
            qty_available: new.qty_available,
            reserved_qty: 0,
            low_stock_alert_qty: new.low_stock_alert_qty,
            selling_price_cents: new.selling_price_cents,
            cost_price_cents: new.cost_price_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, item_number = %item.item_number, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, store_id, item_number, item_type, department,
                name, description, unit_size, unit_type,
                qty_available, reserved_qty, low_stock_alert_qty,
                selling_price_cents, cost_price_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&item.id)
        .bind(&item.store_id)
        .bind(&item.item_number)
        .bind(&item.item_type)
        .bind(&item.department)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.unit_size)
        .bind(&item.unit_type)
        .bind(item.qty_available)
        .bind(item.reserved_qty)
        .bind(item.low_stock_alert_qty)
        .bind(item.selling_price_cents)
        .bind(item.cost_price_cents)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Finds an item with the same defining fields as `new`, if any.
    pub async fn find_existing(&self, new: &NewItem) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE store_id = ?1
              AND item_type = ?2
              AND department = ?3
              AND name = ?4
              AND unit_size IS ?5
              AND unit_type IS ?6
            "#,
        )
        .bind(&new.store_id)
        .bind(&new.item_type)
        .bind(&new.department)
        .bind(&new.name)
        .bind(&new.unit_size)
        .bind(&new.unit_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Updates an item's descriptive fields and pricing.
    ///
    /// The stock counters on the passed value are IGNORED: overwriting
    /// `qty_available`/`reserved_qty` from a stale read would lose
    /// concurrent sale adjustments.
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                item_type = ?2,
                department = ?3,
                name = ?4,
                description = ?5,
                unit_size = ?6,
                unit_type = ?7,
                low_stock_alert_qty = ?8,
                selling_price_cents = ?9,
                cost_price_cents = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.item_type)
        .bind(&item.department)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.unit_size)
        .bind(&item.unit_type)
        .bind(item.low_stock_alert_qty)
        .bind(item.selling_price_cents)
        .bind(item.cost_price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Adjusts sellable stock by a relative delta (positive for goods
    /// received, negative for shrinkage corrections).
    pub async fn restock(&self, id: &str, qty_delta: i64) -> DbResult<()> {
        debug!(id = %id, qty_delta, "Restocking item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                qty_available = qty_available + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(qty_delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Deletes an item. Fails with a foreign key violation while any sale
    /// line still references it - sold items keep their history.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Lists items with search, filters and pagination, newest first.
    pub async fn list(&self, filter: &ItemFilter) -> DbResult<Page<Item>> {
        let page = filter.page.max(1);
        let take = if filter.take == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            filter.take
        };

        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM items");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut list_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM items");
        push_filters(&mut list_query, filter);
        list_query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(take as i64)
            .push(" OFFSET ")
            .push_bind(PageMeta::offset(page, take));

        let records = list_query
            .build_query_as::<Item>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), total, "Item listing");

        Ok(Page {
            records,
            meta: PageMeta::new(page, take, total),
        })
    }

    /// Lightweight listing for the sale screen: everything a cashier needs
    /// to build a line request, newest first.
    pub async fn list_for_sale(&self, store_id: &str) -> DbResult<Vec<ItemSummary>> {
        let items = sqlx::query_as::<_, ItemSummary>(
            r#"
            SELECT id, item_number, name, unit_size, unit_type,
                   qty_available, selling_price_cents
            FROM items
            WHERE store_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Distinct (type, department) pairs for a store's filter dropdowns.
    pub async fn filter_values(&self, store_id: &str) -> DbResult<Vec<ItemFilterValue>> {
        let values = sqlx::query_as::<_, ItemFilterValue>(
            r#"
            SELECT DISTINCT item_type, department
            FROM items
            WHERE store_id = ?1
            ORDER BY item_type, department
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    /// Counts a store's items (for diagnostics).
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Appends the WHERE clause shared by the count and listing queries.
fn push_filters(query: &mut QueryBuilder<Sqlite>, filter: &ItemFilter) {
    query.push(" WHERE store_id = ");
    query.push_bind(filter.store_id.clone());

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            // SQLite LIKE is case-insensitive for ASCII.
            let pattern = format!("%{search}%");
            query.push(" AND (item_number LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR department LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR description LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR unit_size LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR unit_type LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
    }

    if let Some(item_type) = &filter.item_type {
        query.push(" AND item_type = ");
        query.push_bind(item_type.clone());
    }

    if let Some(department) = &filter.department {
        query.push(" AND department = ");
        query.push_bind(department.clone());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::NewStore;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_store(db: &Database) -> String {
        db.users()
            .create_store(NewStore {
                name: "Corner Shop".to_string(),
                industry: "Retail".to_string(),
                location: "12 Main St".to_string(),
                district: "Central".to_string(),
                country: "ZA".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn new_item(store_id: &str, name: &str, department: &str) -> NewItem {
        NewItem {
            store_id: store_id.to_string(),
            item_type: "Grocery".to_string(),
            department: department.to_string(),
            name: name.to_string(),
            description: None,
            unit_size: None,
            unit_type: None,
            qty_available: 10,
            low_stock_alert_qty: None,
            selling_price_cents: 500,
            cost_price_cents: None,
        }
    }

    #[tokio::test]
    async fn item_numbers_are_sequential_per_store() {
        let db = test_db().await;
        let store = seed_store(&db).await;

        let first = db.items().create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        let second = db.items().create(new_item(&store, "Flour 1kg", "Staples")).await.unwrap();

        assert_eq!(first.item_number, "0001");
        assert_eq!(second.item_number, "0002");
        assert_eq!(first.reserved_qty, 0);
    }

    #[tokio::test]
    async fn duplicate_definition_is_rejected() {
        let db = test_db().await;
        let store = seed_store(&db).await;

        db.items().create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        let err = db
            .items()
            .create(new_item(&store, "Rice 1kg", "Staples"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn listing_filters_and_paginates() {
        let db = test_db().await;
        let store = seed_store(&db).await;
        let items = db.items();

        items.create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        items.create(new_item(&store, "Brown Rice 1kg", "Staples")).await.unwrap();
        items.create(new_item(&store, "Dish Soap", "Cleaning")).await.unwrap();

        let page = items
            .list(&ItemFilter {
                store_id: store.clone(),
                search: Some("rice".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.meta.total, 2);

        let page = items
            .list(&ItemFilter {
                store_id: store.clone(),
                department: Some("Cleaning".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.records[0].name, "Dish Soap");

        let page = items
            .list(&ItemFilter {
                store_id: store.clone(),
                page: 2,
                take: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.meta.total_pages, 2);
        assert!(!page.meta.has_next_page);
    }

    #[tokio::test]
    async fn update_does_not_touch_stock_counters() {
        let db = test_db().await;
        let store = seed_store(&db).await;
        let items = db.items();

        let mut item = items.create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        item.name = "Rice 1kg (white)".to_string();
        item.selling_price_cents = 550;
        item.qty_available = 999; // must be ignored
        items.update(&item).await.unwrap();

        let stored = items.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Rice 1kg (white)");
        assert_eq!(stored.selling_price_cents, 550);
        assert_eq!(stored.qty_available, 10);
    }

    #[tokio::test]
    async fn restock_is_a_relative_adjustment() {
        let db = test_db().await;
        let store = seed_store(&db).await;
        let items = db.items();

        let item = items.create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        items.restock(&item.id, 5).await.unwrap();
        items.restock(&item.id, -2).await.unwrap();

        let stored = items.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.qty_available, 13);
    }

    #[tokio::test]
    async fn filter_values_are_distinct_and_sorted() {
        let db = test_db().await;
        let store = seed_store(&db).await;
        let items = db.items();

        items.create(new_item(&store, "Rice 1kg", "Staples")).await.unwrap();
        items.create(new_item(&store, "Flour 1kg", "Staples")).await.unwrap();
        items.create(new_item(&store, "Dish Soap", "Cleaning")).await.unwrap();

        let values = items.filter_values(&store).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].department, "Cleaning");
        assert_eq!(values[1].department, "Staples");
    }
}
