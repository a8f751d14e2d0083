//! # Document Numbering
//!
//! Sequential zero-padded business numbers for sales and items.
//!
//! The storage layer reads the highest number previously issued for a store
//! (inside the current transaction) and this module derives the next one.
//! Numbers are unique and increasing per store; they are NOT guaranteed
//! gap-free — an aborted transaction may burn a number.

use crate::NUMBER_PAD_WIDTH;

/// Derives the next number in a sequence from the last issued one.
///
/// ## Rules
/// - `None` (no documents yet) starts the sequence at `"0001"`.
/// - The numeric value increments by one.
/// - Width is preserved: padding stays at [`NUMBER_PAD_WIDTH`] until the
///   value outgrows it, after which the number simply gets longer
///   (`"9999"` → `"10000"`).
/// - A malformed previous number restarts the sequence rather than failing:
///   numbering must never block a sale.
///
/// ```rust
/// use stockbook_core::numbering::next_in_sequence;
///
/// assert_eq!(next_in_sequence(None), "0001");
/// assert_eq!(next_in_sequence(Some("0041")), "0042");
/// assert_eq!(next_in_sequence(Some("9999")), "10000");
/// ```
pub fn next_in_sequence(last: Option<&str>) -> String {
    let last = last.map(str::trim);
    let value = last
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        .saturating_add(1);

    let width = last.map(str::len).unwrap_or(0).max(NUMBER_PAD_WIDTH);
    format!("{value:0width$}")
}
