//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  item_number    │   │  sale_number    │   │  sale_id (FK)   │       │
//! │  │  qty_available  │   │  status         │   │  item_id (FK)   │       │
//! │  │  reserved_qty   │   │  total_cents    │   │  quantity       │       │
//! │  │  selling_price  │   │  line items     │   │  price snapshot │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   SaleStatus    │   │ PaymentMethod   │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Draft          │   │  Cash           │                             │
//! │  │  Completed      │   │  Card           │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Counter Contract
//! Every item carries two counters:
//! - `qty_available`: stock currently sellable, not held by any draft sale
//! - `reserved_qty`: stock held by draft sales, removed from `qty_available`
//!   but not yet permanently consumed
//!
//! For every item, `qty_available + reserved_qty` equals the stock that
//! would exist with no pending sales, minus what completed sales consumed.
//! Only the sale engine's ledger updates may move these counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
///
/// ## Lifecycle
/// ```text
/// Draft ──► Completed
/// ```
/// One-way. A draft reserves stock; completion consumes the reservation
/// permanently. There is no path out of `Completed`, and no cancelled state:
/// nothing in the sale lifecycle restores consumed stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is in progress; its line quantities are held in `reserved_qty`.
    #[default]
    Draft,
    /// Sale is finalized; its line quantities are consumed for good.
    Completed,
}

impl SaleStatus {
    /// Whether a sale in this status may move to `to`.
    ///
    /// Staying in the same status is always allowed (a no-op update).
    pub fn can_transition(self, to: SaleStatus) -> bool {
        self == to || matches!((self, to), (SaleStatus::Draft, SaleStatus::Completed))
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
}

// =============================================================================
// Item
// =============================================================================

/// An inventory item belonging to one store.
///
/// ## Stock Mutation Rule
/// `qty_available` and `reserved_qty` are mutated exclusively through the
/// sale engine's relative ledger updates. Overwriting either field from a
/// stale read loses concurrent updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this item belongs to.
    pub store_id: String,

    /// Sequential zero-padded business number, unique per store.
    pub item_number: String,

    /// Item category (e.g., "Beverage").
    pub item_type: String,

    /// Department the item is shelved under.
    pub department: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    pub description: Option<String>,
    pub unit_size: Option<String>,
    pub unit_type: Option<String>,

    /// Stock currently sellable.
    pub qty_available: i64,

    /// Stock held by draft sales.
    pub reserved_qty: i64,

    /// Threshold below which the item counts as low on stock.
    pub low_stock_alert_qty: Option<i64>,

    /// Authoritative selling price in cents. Client-submitted prices are
    /// ignored; sales always snapshot this field.
    pub selling_price_cents: i64,

    /// Cost in cents (for margin reporting).
    pub cost_price_cents: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Total stock attributed to this item: sellable plus reserved.
    #[inline]
    pub fn on_hand(&self) -> i64 {
        self.qty_available + self.reserved_qty
    }

    /// Whether the sellable stock has fallen below the alert threshold.
    pub fn is_low_on_stock(&self) -> bool {
        match self.low_stock_alert_qty {
            Some(threshold) => self.qty_available <= threshold,
            None => false,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A draft or completed sale transaction (header only; line items are
/// carried separately and joined as [`SaleWithItems`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub store_id: String,

    /// Sequential zero-padded number, assigned once at creation and never
    /// reassigned. Unique and increasing per store; not gap-free.
    pub sale_number: String,

    /// Optional display label (e.g., a customer reference).
    pub name: Option<String>,

    pub status: SaleStatus,

    pub cashier_id: Option<String>,

    /// Cashier first name resolved at write time; "-" when unresolvable.
    pub cashier_name: String,

    pub payment_method: PaymentMethod,

    pub subtotal_cents: i64,
    pub discount_cents: i64,

    /// Always `subtotal_cents - discount_cents`, recomputed on every line
    /// change. May be negative; the engine does not bound discounts.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze item data at time of (re)pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,

    /// Item this line references for stock accounting.
    pub item_id: String,

    /// Item name at time of sale (frozen).
    pub item_name: String,

    /// Quantity sold; always > 0.
    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen from the item's
    /// authoritative selling price).
    pub unit_price_cents: i64,

    /// Line subtotal (unit_price × quantity).
    pub subtotal_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale header joined with its insertion-ordered line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Store & User
// =============================================================================

/// A store owning inventory and sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: String,
    pub name: String,
    pub industry: String,
    pub location: String,
    pub district: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// A user (owner or cashier) attached to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// National id number; unique across users.
    pub id_number: String,

    pub phone: String,
    pub is_owner: bool,
    pub store_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Draft);
    }

    #[test]
    fn test_status_transitions_are_one_way() {
        assert!(SaleStatus::Draft.can_transition(SaleStatus::Completed));
        assert!(SaleStatus::Draft.can_transition(SaleStatus::Draft));
        assert!(SaleStatus::Completed.can_transition(SaleStatus::Completed));
        assert!(!SaleStatus::Completed.can_transition(SaleStatus::Draft));
    }

    #[test]
    fn test_item_on_hand_sums_counters() {
        let item = sample_item(7, 3);
        assert_eq!(item.on_hand(), 10);
    }

    #[test]
    fn test_low_stock_alert() {
        let mut item = sample_item(2, 0);
        item.low_stock_alert_qty = Some(5);
        assert!(item.is_low_on_stock());

        item.qty_available = 6;
        assert!(!item.is_low_on_stock());

        item.low_stock_alert_qty = None;
        item.qty_available = 0;
        assert!(!item.is_low_on_stock());
    }

    #[test]
    fn test_sale_with_items_serializes_flat() {
        let sale = Sale {
            id: "sale-1".to_string(),
            store_id: "store-1".to_string(),
            sale_number: "0001".to_string(),
            name: None,
            status: SaleStatus::Draft,
            cashier_id: None,
            cashier_name: "-".to_string(),
            payment_method: PaymentMethod::Cash,
            subtotal_cents: 750,
            discount_cents: 0,
            total_cents: 750,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };

        let value = serde_json::to_value(SaleWithItems {
            sale,
            items: vec![],
        })
        .unwrap();

        // Header fields sit at the top level next to the line array.
        assert_eq!(value["sale_number"], "0001");
        assert_eq!(value["status"], "draft");
        assert_eq!(value["payment_method"], "cash");
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    fn sample_item(available: i64, reserved: i64) -> Item {
        Item {
            id: "item-1".to_string(),
            store_id: "store-1".to_string(),
            item_number: "0001".to_string(),
            item_type: "Beverage".to_string(),
            department: "Drinks".to_string(),
            name: "Cola 330ml".to_string(),
            description: None,
            unit_size: Some("330".to_string()),
            unit_type: Some("ml".to_string()),
            qty_available: available,
            reserved_qty: reserved,
            low_stock_alert_qty: None,
            selling_price_cents: 250,
            cost_price_cents: Some(120),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
