//! Money calculation utilities using rust_decimal for precision
//!
//! Prices are stored as `f64`; every sum goes through `Decimal` and is
//! rounded to cents before it is converted back.

use rust_decimal::prelude::*;
use shared::models::OrderLine;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, rounded to cents
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// quantity × unit_price_snapshot
pub fn line_total(line: &OrderLine) -> Decimal {
    to_decimal(line.unit_price_snapshot) * Decimal::from(line.quantity)
}

/// Σ line totals, never re-derived from live product prices
pub fn lines_total<'a>(lines: impl IntoIterator<Item = &'a OrderLine>) -> Decimal {
    lines.into_iter().map(line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, price: f64) -> OrderLine {
        OrderLine {
            product_id: 1,
            quantity,
            unit_price_snapshot: price,
        }
    }

    #[test]
    fn test_lines_total() {
        let lines = vec![line(2, 100.0), line(1, 50.0)];
        assert_eq!(to_f64(lines_total(&lines)), 250.0);
    }

    #[test]
    fn test_no_float_drift() {
        // 0.1 * 3 in f64 is 0.30000000000000004
        let lines = vec![line(3, 0.1), line(1, 0.2)];
        assert_eq!(to_f64(lines_total(&lines)), 0.5);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(to_f64(Decimal::new(12345, 3)), 12.35);
        assert_eq!(to_f64(Decimal::new(12344, 3)), 12.34);
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
