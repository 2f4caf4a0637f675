//! Field validators for request DTOs and bound checks for numeric finders.

use std::borrow::Cow;
use std::fmt::Display;

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::errors::ServiceError;

fn invalid(code: &'static str, msg: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(msg))
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("not_blank", "must not be blank"));
    }
    Ok(())
}

pub fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(invalid("positive", "must be greater than zero"));
    }
    Ok(())
}

pub fn non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid("non_negative", "must not be negative"));
    }
    Ok(())
}

/// ISO 4217 style: three ASCII uppercase letters.
pub fn currency_code(value: &str) -> Result<(), ValidationError> {
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(invalid("currency", "must be a three letter currency code"));
    }
    Ok(())
}

/// Lower bound of a numeric finder must be strictly positive.
pub fn positive_bound(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::Validation(format!("{field} must be greater than zero")));
    }
    Ok(value)
}

pub fn positive_count(field: &str, value: i32) -> Result<i32, ServiceError> {
    if value <= 0 {
        return Err(ServiceError::Validation(format!("{field} must be greater than zero")));
    }
    Ok(value)
}

/// Both ends positive and `low <= high`.
pub fn positive_range(field: &str, low: Decimal, high: Decimal) -> Result<(Decimal, Decimal), ServiceError> {
    positive_bound(field, low)?;
    positive_bound(field, high)?;
    ordered_range(field, low, high)
}

pub fn ordered_range<T: PartialOrd + Display>(field: &str, low: T, high: T) -> Result<(T, T), ServiceError> {
    if low > high {
        return Err(ServiceError::Validation(format!("{field} range is inverted: {low} > {high}")));
    }
    Ok((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_sign_checks() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("x").is_ok());
        assert!(positive_decimal(&Decimal::ZERO).is_err());
        assert!(non_negative_decimal(&Decimal::ZERO).is_ok());
        assert!(non_negative_decimal(&Decimal::new(-5, 0)).is_err());
        assert!(currency_code("EUR").is_ok());
        assert!(currency_code("eur").is_err());
    }

    #[test]
    fn finder_bounds() {
        assert!(matches!(positive_bound("balance", Decimal::ZERO), Err(ServiceError::Validation(_))));
        assert!(positive_count("quantity", -1).is_err());
        assert!(positive_range("amount", Decimal::new(10, 0), Decimal::new(5, 0)).is_err());
        assert_eq!(
            positive_range("amount", Decimal::new(5, 0), Decimal::new(10, 0)).ok(),
            Some((Decimal::new(5, 0), Decimal::new(10, 0)))
        );
    }
}
