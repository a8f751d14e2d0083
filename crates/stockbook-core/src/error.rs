//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  └── ValidationError  - Input / business rule violations               │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - Sale engine failures (wraps both)              │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → caller                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field names, statuses)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::SaleStatus;

/// Input validation and business rule errors.
///
/// These errors occur before any storage mutation is attempted: the engine
/// validates inputs and state transitions up front and refuses the whole
/// operation on the first violation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value must be strictly positive (e.g., line quantities).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value must not be negative (e.g., discount amounts).
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A sale must carry at least one line item.
    #[error("at least one sale item is required")]
    EmptyLineItems,

    /// The same item appears more than once in a line-item list.
    ///
    /// Lines are keyed by item id when quantity diffs are derived; a
    /// duplicate would make the diff ambiguous, so the request is refused.
    #[error("item {item_id} appears more than once in the sale")]
    DuplicateLineItem { item_id: String },

    /// Line items of a completed sale are frozen.
    ///
    /// ## When This Occurs
    /// An update supplies a replacement line-item list for a sale that is
    /// already `Completed`. Stock for that sale has been permanently
    /// consumed; silently accepting new lines would desynchronize the
    /// item counters from the recorded sale.
    #[error("cannot modify items of a completed sale")]
    CompletedSaleItemsImmutable,

    /// The requested status change is not allowed by the sale lifecycle.
    #[error("sale cannot move from {from:?} to {to:?}")]
    InvalidStatusChange { from: SaleStatus, to: SaleStatus },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = ValidationError::Required {
            field: "store_id".to_string(),
        };
        assert_eq!(err.to_string(), "store_id is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::EmptyLineItems;
        assert_eq!(err.to_string(), "at least one sale item is required");
    }

    #[test]
    fn status_change_message_names_both_states() {
        let err = ValidationError::InvalidStatusChange {
            from: SaleStatus::Completed,
            to: SaleStatus::Draft,
        };
        assert_eq!(err.to_string(), "sale cannot move from Completed to Draft");
    }
}
