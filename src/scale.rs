//! Fixed-point price/quantity representation used by event payload fields.
//!
//! The *policy* of how a strategy scales prices is an external concern (see
//! the crate's non-goals); this module only provides the conversion the
//! wire-level event fields need so the bus can carry `Price`/`Quantity`
//! without floating-point drift inside the event log itself.

/// Scale factor applied to both price and quantity fields.
pub const PRICE_SCALE_FACTOR: i64 = 10_000;
pub const QUANTITY_SCALE_FACTOR: i64 = 10_000;
pub const BASIS_POINTS_DIVISOR: i64 = 10_000;

/// Fixed-point price, scaled by [`PRICE_SCALE_FACTOR`].
pub type Price = i64;
/// Fixed-point quantity, scaled by [`QUANTITY_SCALE_FACTOR`].
pub type Quantity = i64;

#[inline]
pub fn float_to_price(value: f64) -> Price {
    (value * PRICE_SCALE_FACTOR as f64).round() as Price
}

#[inline]
pub fn price_to_float(value: Price) -> f64 {
    value as f64 / PRICE_SCALE_FACTOR as f64
}

#[inline]
pub fn float_to_quantity(value: f64) -> Quantity {
    (value * QUANTITY_SCALE_FACTOR as f64).round() as Quantity
}

#[inline]
pub fn quantity_to_float(value: Quantity) -> f64 {
    value as f64 / QUANTITY_SCALE_FACTOR as f64
}

/// Spread between best bid/ask, in basis points. Returns `0` if the mid
/// price is non-positive.
#[inline]
pub fn spread_bps(bid: Price, ask: Price) -> i64 {
    let mid = (bid + ask) / 2;
    if mid <= 0 {
        return 0;
    }
    (ask - bid) * BASIS_POINTS_DIVISOR / mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn price_int_roundtrip_is_exact() {
        for raw in [-1_000_000i64, -1, 0, 1, 12345, 99_999_999] {
            assert_eq!(float_to_price(price_to_float(raw)), raw);
        }
    }

    proptest! {
        #[test]
        fn price_int_roundtrip_prop(raw in -1_000_000_000i64..1_000_000_000i64) {
            prop_assert_eq!(float_to_price(price_to_float(raw)), raw);
        }

        #[test]
        fn price_float_roundtrip_within_one_tick(f in -100_000.0f64..100_000.0f64) {
            let recovered = price_to_float(float_to_price(f));
            prop_assert!((recovered - f).abs() <= 1.0 / PRICE_SCALE_FACTOR as f64 + 1e-9);
        }
    }

    #[test]
    fn spread_bps_zero_mid_is_zero() {
        assert_eq!(spread_bps(0, 0), 0);
        assert_eq!(spread_bps(-100, 100), 0);
    }
}
