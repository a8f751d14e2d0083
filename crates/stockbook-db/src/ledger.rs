//! # Item Ledger
//!
//! Atomic relative adjustments to item stock counters.
//!
//! ## The Delta Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: Absolute update (loses concurrent updates)                  │
//! │     UPDATE items SET qty_available = 7 WHERE id = ?                    │
//! │                                                                         │
//! │  ✅ CORRECT: Relative update                                           │
//! │     UPDATE items SET qty_available = qty_available - 3 WHERE id = ?    │
//! │                                                                         │
//! │  Sale A: reserves 3 → available - 3                                    │
//! │  Sale B: reserves 2 → available - 2                                    │
//! │  Serialized writers compose: -3 + -2 = -5, whatever the order          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger does not reject a counter going negative - the deltas it is
//! handed are derived from the sale's own lines, and refusing them here
//! would leave the sale and its stock accounting disagreeing. It does
//! re-read the row after writing and logs a warning, because a negative
//! counter means some caller mutated stock outside the ledger.
//!
//! Only the sale engine's unit of work may call these functions; every
//! adjustment happens inside the transaction that mutates the owning sale.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::warn;

use crate::engine::{EngineError, EngineResult};
use stockbook_core::StockDelta;

/// Applies one delta to one item row. Fails with `ItemNotFound` when the
/// id does not exist; a no-op delta skips the write entirely.
pub(crate) async fn adjust(
    tx: &mut Transaction<'_, Sqlite>,
    delta: &StockDelta,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    if delta.is_noop() {
        return Ok(());
    }

    let result = sqlx::query(
        r#"
        UPDATE items SET
            qty_available = qty_available + ?1,
            reserved_qty = reserved_qty + ?2,
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(delta.available_delta)
    .bind(delta.reserved_delta)
    .bind(now)
    .bind(&delta.item_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::ItemNotFound(delta.item_id.clone()));
    }

    // Read-your-writes check: a negative counter signals stock was moved
    // outside the ledger somewhere upstream.
    let (qty_available, reserved_qty): (i64, i64) =
        sqlx::query_as("SELECT qty_available, reserved_qty FROM items WHERE id = ?1")
            .bind(&delta.item_id)
            .fetch_one(&mut **tx)
            .await?;

    if qty_available < 0 || reserved_qty < 0 {
        warn!(
            item_id = %delta.item_id,
            qty_available,
            reserved_qty,
            "stock counter went negative; possible lost update upstream"
        );
    }

    Ok(())
}

/// Applies a batch of deltas within the caller's transaction. All-or-nothing:
/// the first failure propagates and the enclosing transaction rolls back.
pub(crate) async fn adjust_many(
    tx: &mut Transaction<'_, Sqlite>,
    deltas: &[StockDelta],
    now: DateTime<Utc>,
) -> EngineResult<()> {
    for delta in deltas {
        adjust(tx, delta, now).await?;
    }
    Ok(())
}
