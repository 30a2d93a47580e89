//! Exact decimal price arithmetic for cart lines.
//!
//! Every function here is pure and deterministic; monetary values never pass
//! through floating point.

use crate::errors::ServiceError;
use rust_decimal::Decimal;

const PERCENT_DIVISOR: Decimal = Decimal::ONE_HUNDRED;

/// Per-unit tax: `base_price × tax_percent / 100`.
pub fn tax_amount(base_price: Decimal, tax_percent: Decimal) -> Result<Decimal, ServiceError> {
    ensure_non_negative("base_price", base_price)?;
    ensure_non_negative("tax_percent", tax_percent)?;
    Ok(base_price * tax_percent / PERCENT_DIVISOR)
}

/// Per-unit discount: `base_price × discount_percent / 100`.
pub fn discount_amount(
    base_price: Decimal,
    discount_percent: Decimal,
) -> Result<Decimal, ServiceError> {
    ensure_non_negative("base_price", base_price)?;
    ensure_non_negative("discount_percent", discount_percent)?;
    Ok(base_price * discount_percent / PERCENT_DIVISOR)
}

/// Line base total: `base_price × qty`.
pub fn line_base_total(base_price: Decimal, qty: i32) -> Result<Decimal, ServiceError> {
    ensure_non_negative("base_price", base_price)?;
    ensure_positive_qty(qty)?;
    Ok(base_price * Decimal::from(qty))
}

/// Line subtotal: `qty × (base_price + tax_amount − discount_amount)`.
///
/// `tax_amount` and `discount_amount` are per-unit values.
pub fn line_subtotal(
    qty: i32,
    base_price: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
) -> Result<Decimal, ServiceError> {
    ensure_positive_qty(qty)?;
    ensure_non_negative("base_price", base_price)?;
    ensure_non_negative("tax_amount", tax_amount)?;
    ensure_non_negative("discount_amount", discount_amount)?;
    Ok(Decimal::from(qty) * (base_price + tax_amount - discount_amount))
}

fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value.is_sign_negative() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

fn ensure_positive_qty(qty: i32) -> Result<(), ServiceError> {
    if qty < 1 {
        return Err(ServiceError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tax_is_percent_of_base() {
        assert_eq!(tax_amount(dec!(75000), dec!(11)).unwrap(), dec!(8250));
        assert_eq!(tax_amount(dec!(0), dec!(11)).unwrap(), dec!(0));
    }

    #[test]
    fn subtotal_combines_tax_and_discount_per_unit() {
        // 2 × (75000 + 8250 − 0) = 166500
        let sub = line_subtotal(2, dec!(75000), dec!(8250), dec!(0)).unwrap();
        assert_eq!(sub, dec!(166500));

        let sub = line_subtotal(3, dec!(100), dec!(11), dec!(5)).unwrap();
        assert_eq!(sub, dec!(318));
    }

    #[test]
    fn negative_inputs_are_rejected() {
        assert!(tax_amount(dec!(-1), dec!(11)).is_err());
        assert!(line_base_total(dec!(100), 0).is_err());
        assert!(line_base_total(dec!(100), -2).is_err());
        assert!(line_subtotal(1, dec!(100), dec!(11), dec!(-1)).is_err());
    }

    #[test]
    fn no_floating_point_drift() {
        // 0.1 + 0.2 style inputs stay exact under Decimal.
        let sub = line_subtotal(3, dec!(0.1), dec!(0.2), dec!(0)).unwrap();
        assert_eq!(sub, dec!(0.9));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn money() -> impl Strategy<Value = Decimal> {
            // cents up to 10_000_000.00
            (0i64..1_000_000_000).prop_map(|c| Decimal::new(c, 2))
        }

        proptest! {
            #[test]
            fn subtotal_matches_definition(
                qty in 1i32..1000,
                base in money(),
                tax in money(),
                discount in money(),
            ) {
                prop_assume!(discount <= base + tax);
                let sub = line_subtotal(qty, base, tax, discount).unwrap();
                prop_assert_eq!(sub, Decimal::from(qty) * (base + tax - discount));
            }

            #[test]
            fn base_total_scales_linearly(qty in 1i32..1000, base in money()) {
                let one = line_base_total(base, 1).unwrap();
                let many = line_base_total(base, qty).unwrap();
                prop_assert_eq!(many, one * Decimal::from(qty));
            }

            #[test]
            fn tax_round_trips_through_percent(base in money(), pct in 0u32..100) {
                let pct = Decimal::from(pct);
                let tax = tax_amount(base, pct).unwrap();
                prop_assert_eq!(tax * Decimal::ONE_HUNDRED, base * pct);
            }
        }
    }
}
