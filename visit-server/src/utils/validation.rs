//! Input validation helpers
//!
//! Centralized checks for request input shared by the engine and handlers.

use shared::models::OrderLineInput;

use crate::utils::{AppError, ErrorCode};

/// Upper bound for a single line quantity
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Upper bound for lines per order
pub const MAX_ORDER_LINES: usize = 100;

/// Opaque secrets (session ids, visit tokens) never exceed this
pub const MAX_SECRET_LEN: usize = 128;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Table numbers are customer-facing and strictly positive
pub fn validate_table_number(number: i64) -> Result<(), AppError> {
    if number <= 0 {
        return Err(AppError::new(ErrorCode::InvalidTableNumber).with_detail("number", number));
    }
    Ok(())
}

/// Non-empty, bounded, positive quantities
pub fn validate_order_lines(lines: &[OrderLineInput]) -> Result<(), AppError> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Too many lines ({}, max {MAX_ORDER_LINES})", lines.len()),
        ));
    }
    for (idx, line) in lines.iter().enumerate() {
        if line.quantity < 1 || line.quantity > MAX_LINE_QUANTITY {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("line", idx)
                .with_detail("quantity", line.quantity));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i64) -> OrderLineInput {
        OrderLineInput {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_empty_lines_rejected() {
        let err = validate_order_lines(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_order_lines(&[line(1, 1), line(2, MAX_LINE_QUANTITY)]).is_ok());
        assert_eq!(
            validate_order_lines(&[line(1, 0)]).unwrap_err().code,
            ErrorCode::InvalidQuantity
        );
        assert_eq!(
            validate_order_lines(&[line(1, -3)]).unwrap_err().code,
            ErrorCode::InvalidQuantity
        );
    }

    #[test]
    fn test_table_number() {
        assert!(validate_table_number(1).is_ok());
        assert_eq!(
            validate_table_number(0).unwrap_err().code,
            ErrorCode::InvalidTableNumber
        );
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("abc", "code", 6).is_ok());
        assert!(validate_required_text("   ", "code", 6).is_err());
        assert!(validate_required_text("1234567", "code", 6).is_err());
    }
}
