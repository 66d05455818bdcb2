//! # Validation Module
//!
//! Checks on raw operator input, run by the register commands before any
//! cart or tab operation sees it.
//!
//! ```text
//! Cashier types ──► command parses ──► validate_* ──► CartSession / SessionManager
//!                                          │
//!                                          └── Err(ValidationError) → ApiError(VALIDATION)
//! ```
//!
//! Business rules (stock ceilings, discount range, payment reconciliation)
//! are not checked here; they live with the state they protect.

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_TYPED_AMOUNT};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed SKU and returns it trimmed.
///
/// ```rust
/// use shopfront_core::validation::validate_sku;
///
/// assert_eq!(validate_sku(" RICE-5KG ").unwrap(), "RICE-5KG");
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(sku.to_string())
}

/// Validates a new customer's name and returns it trimmed.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 120 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 120,
        });
    }

    Ok(name.to_string())
}

/// Validates an optional phone number.
///
/// Blank input means "no phone". Otherwise 7 to 15 digits, with an optional
/// leading `+` and spaces or hyphens as separators.
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "digits only, optionally with + and separators".to_string(),
        });
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must have between 7 and 15 digits".to_string(),
        });
    }

    Ok(Some(phone.to_string()))
}

/// Validates a search query.
///
/// Empty is allowed (the caller returns its default listing).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity typed into a cart line.
///
/// Zero and negatives are allowed here because the cart treats them as
/// "remove the line". Only absurd entries (typing 10000 for 10) are stopped.
pub fn validate_quantity(qty: i64) -> ValidationResult<i64> {
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(qty.max(0))
}

/// Rejects negative cash amounts typed into the payment panel.
///
/// Used for tendered amounts and credit requests. Change returned and the
/// discount are deliberately *not* routed through here: out-of-range values
/// there are a reconciliation outcome, not an input error.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

/// Parses a typed amount such as `"250"` or `"99.50"`.
///
/// Anything beyond ±[`MAX_TYPED_AMOUNT`] is out of range.
pub fn parse_amount(field: &str, input: &str) -> ValidationResult<Money> {
    let amount = input
        .trim()
        .parse::<Money>()
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })?;

    let limit = Money::from_major(MAX_TYPED_AMOUNT);
    if amount > limit || amount < -limit {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_TYPED_AMOUNT,
            max: MAX_TYPED_AMOUNT,
        });
    }

    Ok(amount)
}

// =============================================================================
// Id Validators
// =============================================================================

/// Validates an id minted by this system (UUID text form).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("RICE-5KG").is_ok());
        assert!(validate_sku("atta_10").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name("  Ravi Kumar ").unwrap(), "Ravi Kumar");
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone(None).unwrap(), None);
        assert_eq!(validate_phone(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_phone(Some("+92 300-1234567")).unwrap().as_deref(),
            Some("+92 300-1234567")
        );

        assert!(validate_phone(Some("12345")).is_err());
        assert!(validate_phone(Some("call me")).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(5).unwrap(), 5);
        assert_eq!(validate_quantity(0).unwrap(), 0);
        assert_eq!(validate_quantity(-3).unwrap(), 0);
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_amounts() {
        assert_eq!(parse_amount("tendered", "99.50").unwrap().cents(), 9950);
        assert!(parse_amount("tendered", "abc").is_err());

        assert_eq!(
            parse_amount("discount", "100000000").unwrap(),
            Money::from_major(MAX_TYPED_AMOUNT)
        );
        assert!(matches!(
            parse_amount("discount", "-92233720368547758.07"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_amount("discount", "100000000.01"),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_non_negative("tendered", Money::from_cents(0)).is_ok());
        assert_eq!(
            validate_non_negative("tendered", Money::from_cents(-1)).unwrap_err(),
            ValidationError::MustNotBeNegative {
                field: "tendered".to_string()
            }
        );
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
