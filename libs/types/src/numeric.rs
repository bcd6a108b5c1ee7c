//! Integer token-amount arithmetic
//!
//! All balances are u64 token base units scaled by the owning custody's
//! decimal count. Multiplication goes through u128 intermediates with
//! explicit floor/ceil rounding so no operation can create value out of
//! rounding. `rust_decimal` appears only at the human boundary, converting
//! UI amounts to base units and back.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// `floor(a * b / d)`. `None` on division by zero or u64 overflow.
pub fn mul_div_floor(a: u64, b: u64, d: u64) -> Option<u64> {
    if d == 0 {
        return None;
    }
    let product = (a as u128) * (b as u128);
    u64::try_from(product / d as u128).ok()
}

/// `ceil(a * b / d)`. `None` on division by zero or u64 overflow.
pub fn mul_div_ceil(a: u64, b: u64, d: u64) -> Option<u64> {
    if d == 0 {
        return None;
    }
    let product = (a as u128) * (b as u128);
    u64::try_from(product.div_ceil(d as u128)).ok()
}

/// `10^exp` as u128. `None` when the power exceeds u128 range.
pub fn checked_pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

/// Convert a UI amount (e.g. `1.5` tokens) into base units for the given
/// decimal scale. `None` if the amount is negative, has more fractional
/// digits than the scale, or does not fit in u64.
pub fn to_token_amount(ui_amount: Decimal, decimals: u8) -> Option<u64> {
    if ui_amount.is_sign_negative() || decimals > 28 {
        return None;
    }
    let factor = Decimal::from_i128_with_scale(10i128.checked_pow(decimals as u32)?, 0);
    let scaled = ui_amount.checked_mul(factor)?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_u64()
}

/// Convert base units back into a UI amount for the given decimal scale.
pub fn to_ui_amount(amount: u64, decimals: u8) -> Decimal {
    let mut ui = Decimal::from(amount);
    // Decimal carries at most 28 fractional digits
    let _ = ui.set_scale(u32::from(decimals.min(28)));
    ui.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floor_rounds_down() {
        assert_eq!(mul_div_floor(7, 3, 2), Some(10)); // 21/2 = 10.5
        assert_eq!(mul_div_floor(1, 1, 3), Some(0));
    }

    #[test]
    fn test_mul_div_ceil_rounds_up() {
        assert_eq!(mul_div_ceil(7, 3, 2), Some(11));
        assert_eq!(mul_div_ceil(1, 1, 3), Some(1));
        assert_eq!(mul_div_ceil(6, 2, 3), Some(4)); // exact stays exact
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert_eq!(mul_div_floor(1, 1, 0), None);
        assert_eq!(mul_div_ceil(1, 1, 0), None);
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div_floor(u64::MAX, u64::MAX, 1), None);
        assert_eq!(mul_div_floor(u64::MAX, 2, 2), Some(u64::MAX));
    }

    #[test]
    fn test_to_token_amount() {
        // 1.5 tokens at 6 decimals = 1_500_000 base units
        let ui = Decimal::new(15, 1);
        assert_eq!(to_token_amount(ui, 6), Some(1_500_000));
    }

    #[test]
    fn test_to_token_amount_rejects_sub_unit_precision() {
        // 0.0000005 cannot be represented at 6 decimals
        let ui = Decimal::new(5, 7);
        assert_eq!(to_token_amount(ui, 6), None);
    }

    #[test]
    fn test_to_token_amount_rejects_negative() {
        assert_eq!(to_token_amount(Decimal::from(-1), 6), None);
    }

    #[test]
    fn test_ui_round_trip() {
        let amount = 123_456_789u64;
        let ui = to_ui_amount(amount, 8);
        assert_eq!(to_token_amount(ui, 8), Some(amount));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_floor_and_ceil_differ_by_at_most_one(
                a in any::<u64>(),
                b in any::<u64>(),
                d in 1u64..,
            ) {
                if let (Some(floor), Some(ceil)) =
                    (mul_div_floor(a, b, d), mul_div_ceil(a, b, d))
                {
                    prop_assert!(floor <= ceil);
                    prop_assert!(ceil - floor <= 1);
                }
            }

            #[test]
            fn prop_ui_round_trip(amount in any::<u64>(), decimals in 0u8..=18) {
                let ui = to_ui_amount(amount, decimals);
                prop_assert_eq!(to_token_amount(ui, decimals), Some(amount));
            }
        }
    }
}
