//! # stockbook-db: Storage Layer for Stockbook
//!
//! This crate provides database access for the Stockbook point-of-sale
//! back end. It uses SQLite for storage with sqlx for async operations,
//! and hosts the transactional sale engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  Caller (HTTP layer, CLI, ...)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐   ┌──────────────┐   ┌─────────────────────┐  │   │
//! │  │   │  Database  │   │ Repositories │   │     SaleEngine      │  │   │
//! │  │   │ (pool.rs)  │   │ item / sale  │   │  create_sale        │  │   │
//! │  │   │            │◄──│ user /       │   │  update_sale        │  │   │
//! │  │   │ SqlitePool │   │ insights     │   │  + stock ledger     │  │   │
//! │  │   └────────────┘   └──────────────┘   └─────────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys ON)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Repository implementations (item, sale, user, insights)
//! - [`engine`] - The transactional sale engine and stock ledger
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{Database, DbConfig};
//! use stockbook_db::engine::CreateSaleInput;
//!
//! let db = Database::new(DbConfig::new("path/to/stockbook.db")).await?;
//!
//! // Reads go through repositories
//! let drafts = db.sales().list_drafts(&store_id, 1, 14).await?;
//!
//! // Sale mutations (and all stock movement) go through the engine
//! let sale = db.engine().create_sale(input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use engine::{CreateSaleInput, EngineError, EngineResult, SaleEngine, UpdateSaleInput};

// Repository re-exports for convenience
pub use repository::insights::InsightsRepository;
pub use repository::item::ItemRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
pub use repository::{Page, PageMeta};
