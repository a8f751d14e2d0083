//! # Sale Engine
//!
//! The transactional unit of work for the sale lifecycle. Everything that
//! creates or mutates a sale - and therefore everything that moves stock
//! counters - goes through this module.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (status = Draft)                                            │
//! │     └── create_sale() → header + lines inserted,                       │
//! │         every line moves qty_available → reserved_qty                  │
//! │                                                                         │
//! │  2. EDIT THE DRAFT                                                     │
//! │     └── update_sale(items: [...]) → lines replaced,                    │
//! │         counters adjusted by the per-item quantity diff                │
//! │                                                                         │
//! │  3. COMPLETE                                                           │
//! │     └── update_sale(status: Completed) → reserved_qty released,        │
//! │         the removal from qty_available becomes permanent               │
//! │                                                                         │
//! │  (Creating directly in Completed skips the reservation and consumes   │
//! │   qty_available in one step.)                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Each operation runs inside ONE database transaction: sale header, line
//! rows and ledger deltas commit together or not at all. A missing item id
//! fails the whole operation before anything is persisted - never a
//! partial sale.
//!
//! ## Contention
//! SQLite serializes writers; a competing writer waits up to the pool's
//! busy timeout (default 5 s). On top of that the engine bounds every
//! operation with an overall timeout (default 10 s). A timed-out attempt
//! rolls back completely and surfaces as `TransactionTimeout`; retrying is
//! safe because deltas are always derived from freshly read state, never
//! cached across attempts.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::ledger;
use stockbook_core::numbering::next_in_sequence;
use stockbook_core::reservation::{
    deltas_for_completion, deltas_for_create, deltas_for_replacement, subtotal, total,
};
use stockbook_core::{
    validation, LineRequest, Money, PaymentMethod, PricedLine, Sale, SaleItem, SaleStatus,
    SaleWithItems, ValidationError, UNKNOWN_CASHIER_NAME,
};

/// Default bound on one whole engine operation (resolution, numbering,
/// writes and commit included).
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Errors
// =============================================================================

/// Sale engine failure taxonomy.
///
/// Every failure aborts the transaction; the engine never corrects or
/// retries anything silently. Retry-on-timeout is the caller's policy.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced item id does not exist. The whole create/update is
    /// refused - never a partial sale with only the resolvable items.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The sale id does not exist; checked before any mutation.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// The operation exceeded its time budget and was rolled back. Item
    /// and sale state are exactly as before the attempt; retrying the same
    /// input is safe.
    #[error("transaction timed out; no changes were applied")]
    TransactionTimeout,

    /// Input or lifecycle rule violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unexpected storage-layer failure.
    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Persistence(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Inputs
// =============================================================================

/// Input for creating a sale, as a draft or directly completed.
///
/// Note what is absent: prices. Unit prices are always snapshotted from
/// the items table inside the transaction; whatever a client sends is
/// ignored by construction.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateSaleInput {
    pub store_id: String,
    pub cashier_id: Option<String>,
    /// Optional display label (e.g., a customer reference).
    pub name: Option<String>,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount_cents: i64,
    pub items: Vec<LineRequest>,
}

/// Patch for updating a sale. `None` fields keep their current value.
///
/// `items`, when present, REPLACES the whole line set (an empty list
/// clears the draft and releases every reservation it held).
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct UpdateSaleInput {
    pub status: Option<SaleStatus>,
    pub items: Option<Vec<LineRequest>>,
    pub discount_cents: Option<i64>,
    pub cashier_id: Option<String>,
    pub name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// Engine
// =============================================================================

/// The sale engine. Holds the pool it opens its transactions on; cloning
/// is cheap.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
    operation_timeout: Duration,
}

impl SaleEngine {
    /// Creates an engine with the default operation timeout.
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine {
            pool,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Overrides the overall per-operation timeout.
    pub fn with_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    /// Creates a sale against current stock.
    ///
    /// ## Algorithm
    /// 1. Resolve the cashier display name (best-effort; "-" fallback)
    /// 2. Resolve name + selling price for every requested item; a missing
    ///    id fails the whole operation
    /// 3. Compute subtotal and total (discount is NOT bounded by the
    ///    subtotal; a negative total is the caller's concern)
    /// 4. Assign the next sale number and insert header + lines
    /// 5. Apply stock deltas: a draft reserves, a completed sale consumes
    ///
    /// All of it commits atomically, or none of it does.
    pub async fn create_sale(&self, input: CreateSaleInput) -> EngineResult<SaleWithItems> {
        validation::require_nonempty("store_id", &input.store_id)?;
        validation::validate_sale_lines(&input.items)?;
        validation::validate_discount(input.discount_cents)?;

        debug!(store_id = %input.store_id, lines = input.items.len(), "create_sale");

        match timeout(self.operation_timeout, self.create_sale_tx(&input)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::TransactionTimeout),
        }
    }

    async fn create_sale_tx(&self, input: &CreateSaleInput) -> EngineResult<SaleWithItems> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let cashier_name = resolve_cashier_name(&mut tx, input.cashier_id.as_deref())
            .await?
            .unwrap_or_else(|| UNKNOWN_CASHIER_NAME.to_string());

        let lines = resolve_lines(&mut tx, &input.items).await?;

        let sale_subtotal = subtotal(&lines);
        let sale_total = total(sale_subtotal, Money::from_cents(input.discount_cents));

        let sale_number = next_sale_number(&mut tx, &input.store_id).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            store_id: input.store_id.clone(),
            sale_number,
            name: input.name.clone(),
            status: input.status,
            cashier_id: input.cashier_id.clone(),
            cashier_name,
            payment_method: input.payment_method,
            subtotal_cents: sale_subtotal.cents(),
            discount_cents: input.discount_cents,
            total_cents: sale_total.cents(),
            created_at: now,
            updated_at: now,
            completed_at: (input.status == SaleStatus::Completed).then_some(now),
        };

        insert_sale(&mut tx, &sale).await?;
        let items = insert_lines(&mut tx, &sale.id, &lines, now).await?;

        ledger::adjust_many(&mut tx, &deltas_for_create(input.status, &lines), now).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            status = ?sale.status,
            total = %sale.total(),
            "Sale created"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Applies a patch to an existing sale.
    ///
    /// ## Lifecycle Rules
    /// - The status may only stay put or move Draft → Completed
    /// - A replacement line list is only accepted while the sale is a
    ///   draft; line items of a completed sale are frozen
    /// - Non-item fields (name, cashier, payment method, discount) may
    ///   change in any status; totals are recomputed from the final lines
    ///
    /// ## Stock Accounting
    /// Replacing lines adjusts each item's counters by the signed quantity
    /// diff against the sale's current lines, releases removed lines in
    /// full, and reserves added lines from zero. Completing then clears
    /// `reserved_qty` for the final line set without touching
    /// `qty_available` a second time.
    pub async fn update_sale(
        &self,
        sale_id: &str,
        patch: UpdateSaleInput,
    ) -> EngineResult<SaleWithItems> {
        validation::require_nonempty("sale_id", sale_id)?;
        if let Some(lines) = &patch.items {
            validation::validate_replacement_lines(lines)?;
        }
        if let Some(discount) = patch.discount_cents {
            validation::validate_discount(discount)?;
        }

        debug!(sale_id = %sale_id, "update_sale");

        match timeout(self.operation_timeout, self.update_sale_tx(sale_id, &patch)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::TransactionTimeout),
        }
    }

    async fn update_sale_tx(
        &self,
        sale_id: &str,
        patch: &UpdateSaleInput,
    ) -> EngineResult<SaleWithItems> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let sale = load_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| EngineError::SaleNotFound(sale_id.to_string()))?;
        let existing_lines = load_lines(&mut tx, sale_id).await?;

        let target_status = patch.status.unwrap_or(sale.status);
        if !sale.status.can_transition(target_status) {
            return Err(ValidationError::InvalidStatusChange {
                from: sale.status,
                to: target_status,
            }
            .into());
        }
        if patch.items.is_some() && sale.status == SaleStatus::Completed {
            return Err(ValidationError::CompletedSaleItemsImmutable.into());
        }

        let cashier_name = resolve_cashier_name(&mut tx, patch.cashier_id.as_deref())
            .await?
            .unwrap_or_else(|| sale.cashier_name.clone());

        // Final line set: the replacement when one is supplied (the sale is
        // a draft here, per the guard above), otherwise what the sale has.
        let mut final_lines: Vec<PricedLine> =
            existing_lines.iter().map(PricedLine::from).collect();

        let mut items = existing_lines.clone();
        if let Some(requests) = &patch.items {
            let new_lines = resolve_lines(&mut tx, requests).await?;

            let deltas = deltas_for_replacement(&existing_lines, &new_lines);
            ledger::adjust_many(&mut tx, &deltas, now).await?;

            items = replace_lines(&mut tx, sale_id, &existing_lines, &new_lines, now).await?;
            final_lines = new_lines;
        }

        let sale_subtotal = subtotal(&final_lines);
        let discount_cents = patch.discount_cents.unwrap_or(sale.discount_cents);
        let sale_total = total(sale_subtotal, Money::from_cents(discount_cents));

        let completing =
            sale.status == SaleStatus::Draft && target_status == SaleStatus::Completed;
        if completing {
            ledger::adjust_many(&mut tx, &deltas_for_completion(&final_lines), now).await?;
        }

        let updated = Sale {
            id: sale.id.clone(),
            store_id: sale.store_id.clone(),
            sale_number: sale.sale_number.clone(),
            name: patch.name.clone().or_else(|| sale.name.clone()),
            status: target_status,
            cashier_id: patch.cashier_id.clone().or_else(|| sale.cashier_id.clone()),
            cashier_name,
            payment_method: patch.payment_method.unwrap_or(sale.payment_method),
            subtotal_cents: sale_subtotal.cents(),
            discount_cents,
            total_cents: sale_total.cents(),
            created_at: sale.created_at,
            updated_at: now,
            completed_at: if completing { Some(now) } else { sale.completed_at },
        };
        update_sale_header(&mut tx, &updated).await?;

        tx.commit().await?;

        info!(
            sale_id = %updated.id,
            status = ?updated.status,
            total = %updated.total(),
            "Sale updated"
        );

        Ok(SaleWithItems {
            sale: updated,
            items,
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Resolves a cashier id to a first name. `Ok(None)` when no id was given
/// or the user does not exist - resolution is best-effort and never fails
/// a sale.
async fn resolve_cashier_name(
    tx: &mut Transaction<'_, Sqlite>,
    cashier_id: Option<&str>,
) -> EngineResult<Option<String>> {
    let Some(cashier_id) = cashier_id else {
        return Ok(None);
    };

    let name: Option<String> = sqlx::query_scalar("SELECT first_name FROM users WHERE id = ?1")
        .bind(cashier_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(name)
}

/// Resolves requested lines against current inventory in one query,
/// snapshotting each item's name and authoritative selling price. The
/// first unresolvable id fails the whole operation.
async fn resolve_lines(
    tx: &mut Transaction<'_, Sqlite>,
    requests: &[LineRequest],
) -> EngineResult<Vec<PricedLine>> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, name, selling_price_cents FROM items WHERE id IN (");
    let mut separated = qb.separated(", ");
    for request in requests {
        separated.push_bind(request.item_id.as_str());
    }
    qb.push(")");

    let rows: Vec<(String, String, i64)> = qb.build_query_as().fetch_all(&mut **tx).await?;
    let by_id: HashMap<String, (String, i64)> = rows
        .into_iter()
        .map(|(id, name, price)| (id, (name, price)))
        .collect();

    requests
        .iter()
        .map(|request| {
            let (name, price_cents) = by_id
                .get(&request.item_id)
                .ok_or_else(|| EngineError::ItemNotFound(request.item_id.clone()))?;
            Ok(PricedLine {
                item_id: request.item_id.clone(),
                item_name: name.clone(),
                quantity: request.quantity,
                unit_price: Money::from_cents(*price_cents),
            })
        })
        .collect()
}

/// Assigns the next sale number for a store, reading the current maximum
/// inside this transaction so concurrent creates cannot both observe the
/// same predecessor.
async fn next_sale_number(
    tx: &mut Transaction<'_, Sqlite>,
    store_id: &str,
) -> EngineResult<String> {
    let last: Option<String> =
        sqlx::query_scalar("SELECT MAX(sale_number) FROM sales WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&mut **tx)
            .await?;

    Ok(next_in_sequence(last.as_deref()))
}

async fn load_sale(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
) -> EngineResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(sale)
}

async fn load_lines(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
) -> EngineResult<Vec<SaleItem>> {
    let lines = sqlx::query_as::<_, SaleItem>(
        "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid",
    )
    .bind(sale_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(lines)
}

async fn insert_sale(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, store_id, sale_number, name, status,
            cashier_id, cashier_name, payment_method,
            subtotal_cents, discount_cents, total_cents,
            created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.store_id)
    .bind(&sale.sale_number)
    .bind(&sale.name)
    .bind(sale.status)
    .bind(&sale.cashier_id)
    .bind(&sale.cashier_name)
    .bind(sale.payment_method)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.completed_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
    lines: &[PricedLine],
    now: DateTime<Utc>,
) -> EngineResult<Vec<SaleItem>> {
    let mut rows = Vec::with_capacity(lines.len());

    for line in lines {
        let row = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            item_id: line.item_id.clone(),
            item_name: line.item_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.line_subtotal().cents(),
            created_at: now,
        };
        insert_line(tx, &row).await?;
        rows.push(row);
    }

    Ok(rows)
}

async fn insert_line(tx: &mut Transaction<'_, Sqlite>, row: &SaleItem) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, item_id, item_name,
            quantity, unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&row.id)
    .bind(&row.sale_id)
    .bind(&row.item_id)
    .bind(&row.item_name)
    .bind(row.quantity)
    .bind(row.unit_price_cents)
    .bind(row.subtotal_cents)
    .bind(row.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Reconciles the stored line rows with a replacement set: rows for
/// removed items are deleted, rows for kept items are repriced in place
/// (preserving their insertion position), rows for new items are appended.
async fn replace_lines(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
    old: &[SaleItem],
    new: &[PricedLine],
    now: DateTime<Utc>,
) -> EngineResult<Vec<SaleItem>> {
    let keep: HashSet<&str> = new.iter().map(|line| line.item_id.as_str()).collect();

    for line in old {
        if !keep.contains(line.item_id.as_str()) {
            sqlx::query("DELETE FROM sale_items WHERE id = ?1")
                .bind(&line.id)
                .execute(&mut **tx)
                .await?;
        }
    }

    let old_by_item: HashMap<&str, &SaleItem> = old
        .iter()
        .map(|line| (line.item_id.as_str(), line))
        .collect();

    for line in new {
        match old_by_item.get(line.item_id.as_str()) {
            Some(existing) => {
                sqlx::query(
                    r#"
                    UPDATE sale_items SET
                        item_name = ?2,
                        quantity = ?3,
                        unit_price_cents = ?4,
                        subtotal_cents = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(&existing.id)
                .bind(&line.item_name)
                .bind(line.quantity)
                .bind(line.unit_price.cents())
                .bind(line.line_subtotal().cents())
                .execute(&mut **tx)
                .await?;
            }
            None => {
                let row = SaleItem {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale_id.to_string(),
                    item_id: line.item_id.clone(),
                    item_name: line.item_name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    subtotal_cents: line.line_subtotal().cents(),
                    created_at: now,
                };
                insert_line(tx, &row).await?;
            }
        }
    }

    load_lines(tx, sale_id).await
}

async fn update_sale_header(
    tx: &mut Transaction<'_, Sqlite>,
    sale: &Sale,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        UPDATE sales SET
            name = ?2,
            status = ?3,
            cashier_id = ?4,
            cashier_name = ?5,
            payment_method = ?6,
            subtotal_cents = ?7,
            discount_cents = ?8,
            total_cents = ?9,
            updated_at = ?10,
            completed_at = ?11
        WHERE id = ?1
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.name)
    .bind(sale.status)
    .bind(&sale.cashier_id)
    .bind(&sale.cashier_name)
    .bind(sale.payment_method)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.updated_at)
    .bind(sale.completed_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Pool-level double check used by tests and diagnostics: a sale's
/// reserved quantities must always match its draft lines.
#[allow(dead_code)]
pub(crate) async fn lines_for_sale(pool: &SqlitePool, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let lines = sqlx::query_as::<_, SaleItem>(
        "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid",
    )
    .bind(sale_id)
    .fetch_all(pool)
    .await?;
    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
