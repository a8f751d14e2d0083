//! # Insights Repository
//!
//! Read-only aggregates over completed sales: store revenue over a range
//! and per-item sales series. Draft sales never count - revenue exists
//! once a sale completes.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Reporting window, anchored to "now" at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightRange {
    Today,
    /// Week starts on Sunday.
    ThisWeek,
    ThisMonth,
    ThisYear,
}

impl InsightRange {
    /// Start of the window (midnight UTC) for the given reference time.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let start_date = match self {
            InsightRange::Today => today,
            InsightRange::ThisWeek => today.week(Weekday::Sun).first_day(),
            InsightRange::ThisMonth => today.with_day(1).unwrap_or(today),
            InsightRange::ThisYear => {
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today)
            }
        };
        start_date.and_time(NaiveTime::MIN).and_utc()
    }
}

/// One day's completed-sale totals.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyRevenue {
    /// YYYY-MM-DD
    pub day: String,
    pub revenue_cents: i64,
    pub sale_count: i64,
}

/// Store-level sales insights for one range.
#[derive(Debug, Clone, Serialize)]
pub struct SalesInsights {
    pub range: InsightRange,
    pub total_revenue_cents: i64,
    pub sale_count: i64,
    pub by_day: Vec<DailyRevenue>,
}

/// One day's movement of a single item.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyItemSales {
    /// YYYY-MM-DD
    pub day: String,
    pub units: i64,
    pub revenue_cents: i64,
}

/// Per-item insights: weekly and monthly series plus month totals.
#[derive(Debug, Clone, Serialize)]
pub struct ItemInsights {
    pub week: Vec<DailyItemSales>,
    pub month: Vec<DailyItemSales>,
    pub total_units_sold: i64,
    pub total_revenue_cents: i64,
}

/// Repository for sales/inventory aggregates.
#[derive(Debug, Clone)]
pub struct InsightsRepository {
    pool: SqlitePool,
}

impl InsightsRepository {
    /// Creates a new InsightsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InsightsRepository { pool }
    }

    /// Completed-sale revenue for a store over the range, with a per-day
    /// series for charting.
    pub async fn sales_insights(
        &self,
        store_id: &str,
        range: InsightRange,
    ) -> DbResult<SalesInsights> {
        let since = range.start(Utc::now());

        let by_day = sqlx::query_as::<_, DailyRevenue>(
            r#"
            SELECT date(created_at) AS day,
                   COALESCE(SUM(total_cents), 0) AS revenue_cents,
                   COUNT(*) AS sale_count
            FROM sales
            WHERE store_id = ?1 AND status = 'completed' AND created_at >= ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(store_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let total_revenue_cents = by_day.iter().map(|d| d.revenue_cents).sum();
        let sale_count = by_day.iter().map(|d| d.sale_count).sum();

        Ok(SalesInsights {
            range,
            total_revenue_cents,
            sale_count,
            by_day,
        })
    }

    /// Week and month series for one item, plus month totals.
    pub async fn item_insights(&self, store_id: &str, item_id: &str) -> DbResult<ItemInsights> {
        let now = Utc::now();
        let week = self
            .item_series(store_id, item_id, InsightRange::ThisWeek.start(now))
            .await?;
        let month = self
            .item_series(store_id, item_id, InsightRange::ThisMonth.start(now))
            .await?;

        let total_units_sold = month.iter().map(|d| d.units).sum();
        let total_revenue_cents = month.iter().map(|d| d.revenue_cents).sum();

        Ok(ItemInsights {
            week,
            month,
            total_units_sold,
            total_revenue_cents,
        })
    }

    async fn item_series(
        &self,
        store_id: &str,
        item_id: &str,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<DailyItemSales>> {
        let series = sqlx::query_as::<_, DailyItemSales>(
            r#"
            SELECT date(s.created_at) AS day,
                   COALESCE(SUM(si.quantity), 0) AS units,
                   COALESCE(SUM(si.subtotal_cents), 0) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.store_id = ?1
              AND si.item_id = ?2
              AND s.status = 'completed'
              AND s.created_at >= ?3
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CreateSaleInput;
    use crate::pool::{Database, DbConfig};
    use crate::repository::item::NewItem;
    use crate::repository::user::NewStore;
    use chrono::TimeZone;
    use stockbook_core::{LineRequest, PaymentMethod, SaleStatus};

    #[test]
    fn range_starts() {
        let now = Utc.with_ymd_and_hms(2026, 8, 12, 15, 30, 0).unwrap(); // a Wednesday

        assert_eq!(
            InsightRange::Today.start(now),
            Utc.with_ymd_and_hms(2026, 8, 12, 0, 0, 0).unwrap()
        );
        // Sunday of that week.
        assert_eq!(
            InsightRange::ThisWeek.start(now),
            Utc.with_ymd_and_hms(2026, 8, 9, 0, 0, 0).unwrap()
        );
        assert_eq!(
            InsightRange::ThisMonth.start(now),
            Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            InsightRange::ThisYear.start(now),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn insights_count_completed_sales_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

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
                qty_available: 50,
                low_stock_alert_qty: None,
                selling_price_cents: 250,
                cost_price_cents: None,
            })
            .await
            .unwrap();

        let input = |status| CreateSaleInput {
            store_id: store.id.clone(),
            cashier_id: None,
            name: None,
            status,
            payment_method: PaymentMethod::Cash,
            discount_cents: 0,
            items: vec![LineRequest::new(&item.id, 2)],
        };

        db.engine().create_sale(input(SaleStatus::Completed)).await.unwrap();
        db.engine().create_sale(input(SaleStatus::Completed)).await.unwrap();
        db.engine().create_sale(input(SaleStatus::Draft)).await.unwrap();

        let insights = db
            .insights()
            .sales_insights(&store.id, InsightRange::Today)
            .await
            .unwrap();
        assert_eq!(insights.sale_count, 2);
        assert_eq!(insights.total_revenue_cents, 1000);
        assert_eq!(insights.by_day.len(), 1);

        let item_insights = db.insights().item_insights(&store.id, &item.id).await.unwrap();
        assert_eq!(item_insights.total_units_sold, 4);
        assert_eq!(item_insights.total_revenue_cents, 1000);
        assert_eq!(item_insights.week.len(), 1);
    }
}
