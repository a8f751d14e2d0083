//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate is the **heart** of the Stockbook point-of-sale back end. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Caller (HTTP layer, CLI, ...)                   │   │
//! │  │        create sale ──► update sale ──► list inventory           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │ reservation │  │ numbering│  │   │
//! │  │   │   Item    │  │   Money   │  │ StockDelta  │  │ sequence │  │   │
//! │  │   │   Sale    │  │ subtotal  │  │ state rules │  │  format  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockbook-db (Storage Layer)                    │   │
//! │  │        SQLite queries, migrations, SaleEngine transactions      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Sale, SaleItem, Store, User)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`reservation`] - Stock delta calculus for the sale lifecycle
//! - [`numbering`] - Sequential zero-padded document numbers
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockbook_core::Money` instead of
// `use stockbook_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use reservation::{LineRequest, PricedLine, StockDelta};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Cashier display name recorded on a sale when the cashier id cannot be
/// resolved to a user. Resolution is best-effort; a sale is never rejected
/// because its cashier is unknown.
pub const UNKNOWN_CASHIER_NAME: &str = "-";

/// Default page size for paginated listings (items, draft/completed sales).
pub const DEFAULT_PAGE_SIZE: u32 = 14;

/// Minimum width of sequential document numbers (sale and item numbers).
/// Numbers are zero-padded to this width; longer numbers keep their width.
pub const NUMBER_PAD_WIDTH: usize = 4;
