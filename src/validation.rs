// Validation utilities module
// Custom checks for fields the validator derive cannot express (decimals, cross-field rules)

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

/// Build a ValidationError carrying a human-readable message
pub fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Validates that a percentage lies between 0 and 100 inclusive
pub fn validate_percentage(rate: Decimal) -> Result<(), ValidationError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        Err(field_error("rate_out_of_range", "Rate must be between 0 and 100"))
    } else {
        Ok(())
    }
}

/// Validates that a monetary threshold is not negative
pub fn validate_non_negative(amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        Err(field_error("must_be_non_negative", "Amount must not be negative"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage(dec!(0)).is_ok());
        assert!(validate_percentage(dec!(100)).is_ok());
        assert!(validate_percentage(dec!(12.5)).is_ok());
        assert!(validate_percentage(dec!(-0.01)).is_err());
        assert!(validate_percentage(dec!(100.01)).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(validate_non_negative(dec!(0)).is_ok());
        assert!(validate_non_negative(dec!(10000)).is_ok());
        let err = validate_non_negative(dec!(-1)).unwrap_err();
        assert_eq!(err.code, "must_be_non_negative");
        assert!(err.message.is_some());
    }
}
