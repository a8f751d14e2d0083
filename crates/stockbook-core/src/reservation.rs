//! # Reservation Calculus
//!
//! Pure stock-delta math for the sale lifecycle. The storage layer applies
//! what these functions compute; nothing here touches a database.
//!
//! ## The Two Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   How a Sale Moves Stock                                │
//! │                                                                         │
//! │                    qty_available      reserved_qty                      │
//! │                    ─────────────      ────────────                      │
//! │  create Draft(q)        -q                +q        (reserve)           │
//! │  create Completed(q)    -q                 0        (consume)           │
//! │  grow draft by d        -d                +d        (reserve more)      │
//! │  shrink draft by d      +d                -d        (partial release)   │
//! │  drop a draft line      +q                -q        (full release)      │
//! │  Draft → Completed       0                -q        (settle)            │
//! │                                                                         │
//! │  Settling touches reserved_qty ONLY: the stock already left            │
//! │  qty_available while the sale was a draft. Completion just stops       │
//! │  treating it as held and makes the removal permanent.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deltas are always derived from freshly read state (the sale's current
//! lines and the incoming request), never cached across retries.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::money::Money;
use crate::types::{SaleItem, SaleStatus};

// =============================================================================
// Line Types
// =============================================================================

/// An inbound line request: which item, how many. Prices are never taken
/// from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// A line after resolution against current inventory: name and unit price
/// are frozen snapshots of the item at (re)pricing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    /// Line subtotal: unit price × quantity.
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Existing sale lines re-enter the calculus with their frozen snapshots,
/// exactly as they were last priced.
impl From<&SaleItem> for PricedLine {
    fn from(line: &SaleItem) -> Self {
        PricedLine {
            item_id: line.item_id.clone(),
            item_name: line.item_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price(),
        }
    }
}

// =============================================================================
// Stock Delta
// =============================================================================

/// A relative adjustment to one item's counters. Applied atomically by the
/// storage ledger; never an absolute overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub item_id: String,
    pub available_delta: i64,
    pub reserved_delta: i64,
}

impl StockDelta {
    /// Move `qty` from available into reserved (draft creation/growth).
    /// A negative `qty` releases part of a reservation back to available.
    pub fn reserve(item_id: impl Into<String>, qty: i64) -> Self {
        StockDelta {
            item_id: item_id.into(),
            available_delta: -qty,
            reserved_delta: qty,
        }
    }

    /// Remove `qty` from available outright (direct completed sale).
    pub fn consume(item_id: impl Into<String>, qty: i64) -> Self {
        StockDelta {
            item_id: item_id.into(),
            available_delta: -qty,
            reserved_delta: 0,
        }
    }

    /// Return a dropped draft line's full quantity to available.
    pub fn release(item_id: impl Into<String>, qty: i64) -> Self {
        StockDelta {
            item_id: item_id.into(),
            available_delta: qty,
            reserved_delta: -qty,
        }
    }

    /// Make a draft reservation permanent: clear the hold without touching
    /// available (it was already removed when the reservation was taken).
    pub fn settle(item_id: impl Into<String>, qty: i64) -> Self {
        StockDelta {
            item_id: item_id.into(),
            available_delta: 0,
            reserved_delta: -qty,
        }
    }

    /// True when applying this delta would change nothing.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.available_delta == 0 && self.reserved_delta == 0
    }
}

// =============================================================================
// Delta Derivation
// =============================================================================

/// Deltas for creating a brand-new sale with the given lines.
///
/// Draft sales reserve; completed sales consume directly.
pub fn deltas_for_create(status: SaleStatus, lines: &[PricedLine]) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|line| match status {
            SaleStatus::Draft => StockDelta::reserve(&line.item_id, line.quantity),
            SaleStatus::Completed => StockDelta::consume(&line.item_id, line.quantity),
        })
        .collect()
}

/// Deltas for replacing a draft sale's line set with a new one.
///
/// For every item in both sets the adjustment is the signed quantity diff:
/// growing a line reserves more, shrinking it releases some. Items present
/// only in the old set are released in full; items present only in the new
/// set are treated as growing from zero. Unchanged lines produce nothing.
pub fn deltas_for_replacement(old: &[SaleItem], new: &[PricedLine]) -> Vec<StockDelta> {
    let old_qty: HashMap<&str, i64> = old
        .iter()
        .map(|line| (line.item_id.as_str(), line.quantity))
        .collect();

    let mut deltas: Vec<StockDelta> = new
        .iter()
        .filter_map(|line| {
            let previous = old_qty.get(line.item_id.as_str()).copied().unwrap_or(0);
            let diff = line.quantity - previous;
            let delta = StockDelta::reserve(&line.item_id, diff);
            (!delta.is_noop()).then_some(delta)
        })
        .collect();

    // Lines dropped from the sale give their whole hold back.
    let keeps: HashSet<&str> = new.iter().map(|l| (l.item_id.as_str())).collect();
    deltas.extend(
        old.iter()
            .filter(|line| !keeps.contains(line.item_id.as_str()))
            .map(|line| StockDelta::release(&line.item_id, line.quantity)),
    );

    deltas
}

/// Deltas for completing a draft: settle every reservation in the final
/// line set. `qty_available` is deliberately untouched here.
pub fn deltas_for_completion(lines: &[PricedLine]) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|line| StockDelta::settle(&line.item_id, line.quantity))
        .collect()
}

// =============================================================================
// Totals
// =============================================================================

/// Sale subtotal: sum of line subtotals.
pub fn subtotal(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::line_subtotal).sum()
}

/// Sale total: subtotal minus the flat discount. Not clamped; a discount
/// exceeding the subtotal yields a negative total, which the engine stores
/// as computed.
pub fn total(subtotal: Money, discount: Money) -> Money {
    subtotal - discount
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn priced(item_id: &str, quantity: i64, unit_price_cents: i64) -> PricedLine {
        PricedLine {
            item_id: item_id.to_string(),
            item_name: format!("Item {item_id}"),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    fn existing(item_id: &str, quantity: i64, unit_price_cents: i64) -> SaleItem {
        SaleItem {
            id: format!("line-{item_id}"),
            sale_id: "sale-1".to_string(),
            item_id: item_id.to_string(),
            item_name: format!("Item {item_id}"),
            quantity,
            unit_price_cents,
            subtotal_cents: quantity * unit_price_cents,
            created_at: Utc::now(),
        }
    }

    fn delta_for<'a>(deltas: &'a [StockDelta], item_id: &str) -> &'a StockDelta {
        deltas
            .iter()
            .find(|d| d.item_id == item_id)
            .unwrap_or_else(|| panic!("no delta for {item_id}"))
    }

    #[test]
    fn create_draft_reserves_every_line() {
        let lines = vec![priced("a", 3, 100), priced("b", 2, 250)];
        let deltas = deltas_for_create(SaleStatus::Draft, &lines);

        assert_eq!(deltas.len(), 2);
        let a = delta_for(&deltas, "a");
        assert_eq!((a.available_delta, a.reserved_delta), (-3, 3));
        let b = delta_for(&deltas, "b");
        assert_eq!((b.available_delta, b.reserved_delta), (-2, 2));
    }

    #[test]
    fn create_completed_consumes_without_reserving() {
        let lines = vec![priced("a", 4, 100)];
        let deltas = deltas_for_create(SaleStatus::Completed, &lines);

        let a = delta_for(&deltas, "a");
        assert_eq!((a.available_delta, a.reserved_delta), (-4, 0));
    }

    #[test]
    fn replacement_grows_and_shrinks_by_diff() {
        let old = vec![existing("a", 3, 100), existing("b", 5, 200)];
        let new = vec![priced("a", 5, 100), priced("b", 2, 200)];
        let deltas = deltas_for_replacement(&old, &new);

        // a grew by 2: reserve 2 more. b shrank by 3: release 3.
        let a = delta_for(&deltas, "a");
        assert_eq!((a.available_delta, a.reserved_delta), (-2, 2));
        let b = delta_for(&deltas, "b");
        assert_eq!((b.available_delta, b.reserved_delta), (3, -3));
    }

    #[test]
    fn replacement_releases_removed_lines_in_full() {
        let old = vec![existing("a", 3, 100), existing("b", 5, 200)];
        let new = vec![priced("a", 3, 100)];
        let deltas = deltas_for_replacement(&old, &new);

        // a unchanged: no delta at all. b removed: full release.
        assert_eq!(deltas.len(), 1);
        let b = delta_for(&deltas, "b");
        assert_eq!((b.available_delta, b.reserved_delta), (5, -5));
    }

    #[test]
    fn replacement_treats_added_lines_as_growth_from_zero() {
        let old = vec![existing("a", 3, 100)];
        let new = vec![priced("a", 3, 100), priced("c", 4, 150)];
        let deltas = deltas_for_replacement(&old, &new);

        assert_eq!(deltas.len(), 1);
        let c = delta_for(&deltas, "c");
        assert_eq!((c.available_delta, c.reserved_delta), (-4, 4));
    }

    #[test]
    fn replacement_with_empty_new_set_releases_everything() {
        let old = vec![existing("a", 3, 100), existing("b", 5, 200)];
        let deltas = deltas_for_replacement(&old, &[]);

        assert_eq!(deltas.len(), 2);
        let a = delta_for(&deltas, "a");
        assert_eq!((a.available_delta, a.reserved_delta), (3, -3));
        let b = delta_for(&deltas, "b");
        assert_eq!((b.available_delta, b.reserved_delta), (5, -5));
    }

    #[test]
    fn completion_settles_reservations_only() {
        let lines = vec![priced("a", 5, 100), priced("b", 2, 200)];
        let deltas = deltas_for_completion(&lines);

        for delta in &deltas {
            assert_eq!(delta.available_delta, 0);
        }
        assert_eq!(delta_for(&deltas, "a").reserved_delta, -5);
        assert_eq!(delta_for(&deltas, "b").reserved_delta, -2);
    }

    /// Net counter movement of draft-create followed by completion must
    /// equal a direct completed create: available -q, reserved back to 0.
    #[test]
    fn draft_then_complete_equals_direct_completed_create() {
        let lines = vec![priced("a", 3, 100)];

        let mut available = 0i64;
        let mut reserved = 0i64;
        for delta in deltas_for_create(SaleStatus::Draft, &lines)
            .iter()
            .chain(deltas_for_completion(&lines).iter())
        {
            available += delta.available_delta;
            reserved += delta.reserved_delta;
        }

        let direct = deltas_for_create(SaleStatus::Completed, &lines);
        assert_eq!(available, direct[0].available_delta);
        assert_eq!(reserved, direct[0].reserved_delta);
    }

    #[test]
    fn priced_line_from_sale_item_keeps_snapshots() {
        let line = existing("a", 2, 375);
        let priced = PricedLine::from(&line);
        assert_eq!(priced.item_id, "a");
        assert_eq!(priced.quantity, 2);
        assert_eq!(priced.unit_price.cents(), 375);
        assert_eq!(priced.line_subtotal().cents(), 750);
    }

    #[test]
    fn totals() {
        let lines = vec![priced("a", 3, 100), priced("b", 2, 250)];
        let sub = subtotal(&lines);
        assert_eq!(sub.cents(), 800);

        assert_eq!(total(sub, Money::from_cents(300)).cents(), 500);
        // Discounts are not clamped to the subtotal.
        assert_eq!(total(sub, Money::from_cents(1000)).cents(), -200);
    }
}
