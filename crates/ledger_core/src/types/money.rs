//! Fixed-point money arithmetic.
//!
//! All money and share fields use [`rust_decimal::Decimal`]; floating point is
//! never used for balances, amounts, or share counts. Disbursement amounts are
//! truncated to minor units (cents) and rounding remainders are redistributed
//! by the payout engine's largest-remainder step, so sums stay exact.

use rust_decimal::Decimal;

/// Money amount in major units with fixed-point semantics.
///
/// A type alias rather than a newtype: arithmetic on `Decimal` is already
/// exact, and the ledger moves amounts through serde and arithmetic too often
/// for wrapper plumbing to pay its way.
pub type Money = Decimal;

/// Number of decimal places in a minor unit (cents).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Truncates an amount down to minor units.
///
/// Always truncates toward zero for non-negative amounts; the payout engine
/// never produces negative line amounts.
///
/// # Examples
///
/// ```
/// use ledger_core::types::money::floor_to_minor;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(floor_to_minor(dec!(33.336)), dec!(33.33));
/// assert_eq!(floor_to_minor(dec!(50)), dec!(50.00));
/// ```
#[inline]
pub fn floor_to_minor(amount: Money) -> Money {
    amount.trunc_with_scale(MINOR_UNIT_SCALE)
}

/// One minor unit (0.01).
#[inline]
pub fn minor_unit() -> Money {
    Decimal::new(1, MINOR_UNIT_SCALE)
}

/// Returns true when the amount is strictly greater than zero.
#[inline]
pub fn is_positive(amount: Money) -> bool {
    amount > Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn floor_truncates_never_rounds_up() {
        assert_eq!(floor_to_minor(dec!(33.339)), dec!(33.33));
        assert_eq!(floor_to_minor(dec!(33.331)), dec!(33.33));
        assert_eq!(floor_to_minor(dec!(0.009)), dec!(0.00));
    }

    #[test]
    fn floor_is_identity_on_minor_amounts() {
        assert_eq!(floor_to_minor(dec!(100.25)), dec!(100.25));
    }

    #[test]
    fn minor_unit_is_one_cent() {
        assert_eq!(minor_unit(), dec!(0.01));
    }

    #[test]
    fn positivity() {
        assert!(is_positive(dec!(0.01)));
        assert!(!is_positive(Decimal::ZERO));
        assert!(!is_positive(dec!(-1)));
    }
}
