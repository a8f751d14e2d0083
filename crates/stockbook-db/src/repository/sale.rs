//! # Sale Repository
//!
//! Read-side database operations for sales: lookups and paginated
//! listings. Anything that MUTATES a sale (and therefore stock) lives in
//! the engine module, inside a transaction.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{Page, PageMeta};
use stockbook_core::{Sale, SaleItem, SaleWithItems};

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale with its line items in insertion order.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists a store's draft sales, newest first, lines attached.
    pub async fn list_drafts(
        &self,
        store_id: &str,
        page: u32,
        take: u32,
    ) -> DbResult<Page<SaleWithItems>> {
        self.list_by_status(store_id, true, page, take).await
    }

    /// Lists a store's non-draft (completed) sales, newest first, lines
    /// attached.
    pub async fn list_completed(
        &self,
        store_id: &str,
        page: u32,
        take: u32,
    ) -> DbResult<Page<SaleWithItems>> {
        self.list_by_status(store_id, false, page, take).await
    }

    async fn list_by_status(
        &self,
        store_id: &str,
        drafts: bool,
        page: u32,
        take: u32,
    ) -> DbResult<Page<SaleWithItems>> {
        let page = page.max(1);
        let take = take.max(1);
        let comparison = if drafts { "=" } else { "!=" };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM sales WHERE store_id = ?1 AND status {comparison} 'draft'"
        ))
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT * FROM sales
            WHERE store_id = ?1 AND status {comparison} 'draft'
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(store_id)
        .bind(take as i64)
        .bind(PageMeta::offset(page, take))
        .fetch_all(&self.pool)
        .await?;

        let records = self.attach_items(sales).await?;

        debug!(count = records.len(), total, drafts, "Sale listing");

        Ok(Page {
            records,
            meta: PageMeta::new(page, take, total),
        })
    }

    /// Attaches line items to a page of sales with a single IN query,
    /// preserving both sale order and per-sale line insertion order.
    async fn attach_items(&self, sales: Vec<Sale>) -> DbResult<Vec<SaleWithItems>> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM sale_items WHERE sale_id IN (");
        let mut separated = query.separated(", ");
        for sale in &sales {
            separated.push_bind(sale.id.clone());
        }
        query.push(") ORDER BY created_at, rowid");

        let mut lines = query
            .build_query_as::<SaleItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sales
            .into_iter()
            .map(|sale| {
                let (mine, rest): (Vec<SaleItem>, Vec<SaleItem>) =
                    lines.drain(..).partition(|line| line.sale_id == sale.id);
                lines = rest;
                SaleWithItems { sale, items: mine }
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::engine::{CreateSaleInput, UpdateSaleInput};
    use crate::pool::{Database, DbConfig};
    use crate::repository::item::NewItem;
    use crate::repository::user::NewStore;
    use stockbook_core::{LineRequest, PaymentMethod, SaleStatus};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed(db: &Database) -> (String, String) {
        let store = db
            .users()
            .create_store(NewStore {
                name: "Corner Shop".to_string(),
                industry: "Retail".to_string(),
                location: "12 Main St".to_string(),
                district: "Central".to_string(),
                country: "ZA".to_string(),
            })
            .await
            .unwrap();

        let item = db
            .items()
            .create(NewItem {
                store_id: store.id.clone(),
                item_type: "Beverage".to_string(),
                department: "Drinks".to_string(),
                name: "Cola 330ml".to_string(),
                description: None,
                unit_size: None,
                unit_type: None,
                qty_available: 100,
                low_stock_alert_qty: None,
                selling_price_cents: 250,
                cost_price_cents: None,
            })
            .await
            .unwrap();

        (store.id, item.id)
    }

    fn sale_input(store_id: &str, item_id: &str, status: SaleStatus) -> CreateSaleInput {
        CreateSaleInput {
            store_id: store_id.to_string(),
            cashier_id: None,
            name: None,
            status,
            payment_method: PaymentMethod::Cash,
            discount_cents: 0,
            items: vec![LineRequest::new(item_id, 1)],
        }
    }

    #[tokio::test]
    async fn listings_split_by_status() {
        let db = test_db().await;
        let (store, item) = seed(&db).await;
        let engine = db.engine();

        let draft = engine
            .create_sale(sale_input(&store, &item, SaleStatus::Draft))
            .await
            .unwrap();
        engine
            .create_sale(sale_input(&store, &item, SaleStatus::Completed))
            .await
            .unwrap();

        let drafts = db.sales().list_drafts(&store, 1, 10).await.unwrap();
        assert_eq!(drafts.meta.total, 1);
        assert_eq!(drafts.records[0].sale.id, draft.sale.id);
        assert_eq!(drafts.records[0].items.len(), 1);

        let completed = db.sales().list_completed(&store, 1, 10).await.unwrap();
        assert_eq!(completed.meta.total, 1);
        assert_eq!(completed.records[0].sale.status, SaleStatus::Completed);

        // Completing the draft moves it between listings.
        engine
            .update_sale(
                &draft.sale.id,
                UpdateSaleInput {
                    status: Some(SaleStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(db.sales().list_drafts(&store, 1, 10).await.unwrap().meta.total, 0);
        assert_eq!(
            db.sales().list_completed(&store, 1, 10).await.unwrap().meta.total,
            2
        );
    }

    #[tokio::test]
    async fn listings_paginate_newest_first() {
        let db = test_db().await;
        let (store, item) = seed(&db).await;
        let engine = db.engine();

        for _ in 0..3 {
            engine
                .create_sale(sale_input(&store, &item, SaleStatus::Completed))
                .await
                .unwrap();
        }

        let first = db.sales().list_completed(&store, 1, 2).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.meta.total, 3);
        assert!(first.meta.has_next_page);
        // Newest first: the last-issued sale number leads.
        assert_eq!(first.records[0].sale.sale_number, "0003");

        let second = db.sales().list_completed(&store, 2, 2).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert!(!second.meta.has_next_page);
    }

    #[tokio::test]
    async fn get_with_items_returns_lines_in_order() {
        let db = test_db().await;
        let (store, item) = seed(&db).await;

        let sale = db
            .engine()
            .create_sale(sale_input(&store, &item, SaleStatus::Draft))
            .await
            .unwrap();

        let loaded = db.sales().get_with_items(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.sale.id, sale.sale.id);
        assert_eq!(loaded.items.len(), 1);

        assert!(db.sales().get_with_items("missing").await.unwrap().is_none());
    }
}
