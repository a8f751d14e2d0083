//! # Validation Module
//!
//! Input validation rules for Stockbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP layer, CLI, ...)                                │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Runs before any storage mutation is attempted                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::reservation::LineRequest;

/// Maximum length accepted for free-text name fields.
pub const MAX_NAME_LEN: usize = 200;

/// Rejects an empty (or whitespace-only) required string field.
pub fn require_nonempty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a display name (item name, store name, ...).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    require_nonempty(field, value)?;

    if value.trim().len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates the line-item list of a new sale: at least one line, every
/// quantity strictly positive, every item id present.
pub fn validate_sale_lines(lines: &[LineRequest]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyLineItems);
    }
    validate_replacement_lines(lines)
}

/// Validates a replacement line-item list for an update. Unlike creation,
/// an empty list is allowed here: it clears the draft and releases every
/// reservation it held.
pub fn validate_replacement_lines(lines: &[LineRequest]) -> ValidationResult<()> {
    let mut seen = std::collections::HashSet::new();
    for line in lines {
        require_nonempty("item_id", &line.item_id)?;
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if !seen.insert(line.item_id.as_str()) {
            return Err(ValidationError::DuplicateLineItem {
                item_id: line.item_id.clone(),
            });
        }
    }
    Ok(())
}

/// Validates a flat discount amount in cents. Discounts may exceed the
/// subtotal (yielding a negative total) but may not themselves be negative.
pub fn validate_discount(discount_cents: i64) -> ValidationResult<()> {
    if discount_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount_amount".to_string(),
        });
    }
    Ok(())
}

/// Validates the defining fields of a new inventory item.
pub fn validate_item_definition(
    item_type: &str,
    department: &str,
    name: &str,
    selling_price_cents: i64,
) -> ValidationResult<()> {
    require_nonempty("item_type", item_type)?;
    require_nonempty("department", department)?;
    validate_name("name", name)?;

    if selling_price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "selling_price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_nonempty() {
        assert!(require_nonempty("store_id", "s1").is_ok());
        assert!(require_nonempty("store_id", "").is_err());
        assert!(require_nonempty("store_id", "   ").is_err());
    }

    #[test]
    fn test_validate_name_length() {
        assert!(validate_name("name", "Cola 330ml").is_ok());
        assert!(validate_name("name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_sale_lines_must_not_be_empty() {
        assert_eq!(
            validate_sale_lines(&[]),
            Err(ValidationError::EmptyLineItems)
        );
    }

    #[test]
    fn test_sale_lines_quantities_must_be_positive() {
        let lines = vec![LineRequest::new("a", 2), LineRequest::new("b", 0)];
        assert_eq!(
            validate_sale_lines(&lines),
            Err(ValidationError::MustBePositive {
                field: "quantity".to_string()
            })
        );

        let lines = vec![LineRequest::new("a", -1)];
        assert!(validate_sale_lines(&lines).is_err());
    }

    #[test]
    fn test_replacement_lines_may_be_empty() {
        assert!(validate_replacement_lines(&[]).is_ok());
    }

    #[test]
    fn test_duplicate_item_ids_rejected() {
        let lines = vec![LineRequest::new("a", 2), LineRequest::new("a", 3)];
        assert_eq!(
            validate_sale_lines(&lines),
            Err(ValidationError::DuplicateLineItem {
                item_id: "a".to_string()
            })
        );
    }

    #[test]
    fn test_discount_must_not_be_negative() {
        assert!(validate_discount(0).is_ok());
        assert!(validate_discount(500).is_ok());
        assert!(validate_discount(-1).is_err());
    }

    #[test]
    fn test_item_definition() {
        assert!(validate_item_definition("Beverage", "Drinks", "Cola", 250).is_ok());
        assert!(validate_item_definition("", "Drinks", "Cola", 250).is_err());
        assert!(validate_item_definition("Beverage", "Drinks", "Cola", 0).is_err());
    }
}
