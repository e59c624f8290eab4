//! Largest-remainder apportionment of a gross amount across holdings.

use ledger_core::domain::Holding;
use ledger_core::types::money::{floor_to_minor, minor_unit, Money};
use ledger_core::types::InvestmentId;
use rust_decimal::Decimal;

/// One investment's computed share of a payout.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// The investment being paid.
    pub investment_id: InvestmentId,
    /// Shares held at snapshot time.
    pub shares: Decimal,
    /// Allocated amount in minor-unit precision.
    pub amount: Money,
}

/// Splits `total` across `holdings` pro rata to `shares / issued_shares`.
///
/// Each raw pro-rata amount is truncated to minor units; the truncated cents
/// are then handed back one at a time to the holdings with the largest
/// fractional remainder (ties broken by snapshot order), so the allocations
/// sum to `total` exactly. `total` must already be in minor-unit precision.
///
/// # Examples
///
/// ```
/// use ledger_core::domain::Holding;
/// use ledger_core::types::InvestmentId;
/// use ledger_engine::apportion;
/// use rust_decimal_macros::dec;
///
/// let holdings = vec![
///     Holding { investment_id: InvestmentId::new("INV001"), shares: dec!(333) },
///     Holding { investment_id: InvestmentId::new("INV002"), shares: dec!(333) },
///     Holding { investment_id: InvestmentId::new("INV003"), shares: dec!(334) },
/// ];
/// let allocations = apportion(dec!(100.00), &holdings, dec!(1000));
/// let sum: rust_decimal::Decimal = allocations.iter().map(|a| a.amount).sum();
/// assert_eq!(sum, dec!(100.00));
/// ```
pub fn apportion(total: Money, holdings: &[Holding], issued_shares: Decimal) -> Vec<Allocation> {
    if holdings.is_empty() || issued_shares <= Decimal::ZERO {
        return Vec::new();
    }

    let mut allocations = Vec::with_capacity(holdings.len());
    let mut remainders = Vec::with_capacity(holdings.len());
    let mut allocated = Decimal::ZERO;

    for (index, holding) in holdings.iter().enumerate() {
        let raw = total * holding.shares / issued_shares;
        let floored = floor_to_minor(raw);
        allocated += floored;
        remainders.push((index, raw - floored));
        allocations.push(Allocation {
            investment_id: holding.investment_id.clone(),
            shares: holding.shares,
            amount: floored,
        });
    }

    // Largest fractional remainder first; ties keep snapshot order.
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let cent = minor_unit();
    let mut leftover = total - allocated;
    while leftover >= cent {
        for (index, _) in &remainders {
            if leftover < cent {
                break;
            }
            allocations[*index].amount += cent;
            leftover -= cent;
        }
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn holdings(shares: &[(&str, Decimal)]) -> Vec<Holding> {
        shares
            .iter()
            .map(|(id, s)| Holding {
                investment_id: InvestmentId::new(*id),
                shares: *s,
            })
            .collect()
    }

    #[test]
    fn even_split_needs_no_remainder() {
        let holdings = holdings(&[
            ("INV001", dec!(500)),
            ("INV002", dec!(300)),
            ("INV003", dec!(200)),
        ]);
        let allocations = apportion(dec!(100.00), &holdings, dec!(1000));
        assert_eq!(allocations[0].amount, dec!(50.00));
        assert_eq!(allocations[1].amount, dec!(30.00));
        assert_eq!(allocations[2].amount, dec!(20.00));
    }

    #[test]
    fn uneven_split_assigns_remainder_to_largest_fraction() {
        let holdings = holdings(&[
            ("INV001", dec!(333)),
            ("INV002", dec!(333)),
            ("INV003", dec!(334)),
        ]);
        let allocations = apportion(dec!(100.00), &holdings, dec!(1000));
        let sum: Decimal = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(sum, dec!(100.00));
        // 33.30 / 33.30 / 33.40 raw; the leftover cent lands on the largest remainder
        assert_eq!(allocations[2].amount, dec!(33.40));
        assert_eq!(allocations[0].amount + allocations[1].amount, dec!(66.60));
    }

    #[test]
    fn prime_share_counts_still_sum_exactly() {
        let holdings = holdings(&[
            ("INV001", dec!(7)),
            ("INV002", dec!(11)),
            ("INV003", dec!(13)),
        ]);
        let allocations = apportion(dec!(100.00), &holdings, dec!(31));
        let sum: Decimal = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(sum, dec!(100.00));
    }

    #[test]
    fn single_holder_takes_everything() {
        let holdings = holdings(&[("INV001", dec!(250))]);
        let allocations = apportion(dec!(99.99), &holdings, dec!(250));
        assert_eq!(allocations[0].amount, dec!(99.99));
    }

    #[test]
    fn empty_holdings_allocate_nothing() {
        assert!(apportion(dec!(100.00), &[], dec!(1000)).is_empty());
    }

    #[test]
    fn no_allocation_goes_negative_or_over() {
        let holdings = holdings(&[("INV001", dec!(1)), ("INV002", dec!(9999))]);
        let allocations = apportion(dec!(0.01), &holdings, dec!(10000));
        let sum: Decimal = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(sum, dec!(0.01));
        assert!(allocations.iter().all(|a| a.amount >= Decimal::ZERO));
    }

    proptest! {
        #[test]
        fn allocations_always_sum_to_total(
            share_counts in prop::collection::vec(1u64..100_000, 1..40),
            total_cents in 1u64..10_000_000,
        ) {
            let holdings: Vec<Holding> = share_counts
                .iter()
                .enumerate()
                .map(|(i, s)| Holding {
                    investment_id: InvestmentId::new(format!("INV{:04}", i)),
                    shares: Decimal::from(*s),
                })
                .collect();
            let issued: Decimal = holdings.iter().map(|h| h.shares).sum();
            let total = Decimal::new(total_cents as i64, 2);

            let allocations = apportion(total, &holdings, issued);
            let sum: Decimal = allocations.iter().map(|a| a.amount).sum();
            prop_assert_eq!(sum, total);
            prop_assert!(allocations.iter().all(|a| a.amount >= Decimal::ZERO));
        }

        #[test]
        fn each_allocation_stays_within_one_cent_of_exact_pro_rata(
            share_counts in prop::collection::vec(1u64..10_000, 2..20),
            total_cents in 1u64..1_000_000,
        ) {
            let holdings: Vec<Holding> = share_counts
                .iter()
                .enumerate()
                .map(|(i, s)| Holding {
                    investment_id: InvestmentId::new(format!("INV{:04}", i)),
                    shares: Decimal::from(*s),
                })
                .collect();
            let issued: Decimal = holdings.iter().map(|h| h.shares).sum();
            let total = Decimal::new(total_cents as i64, 2);

            for allocation in apportion(total, &holdings, issued) {
                let exact = total * allocation.shares / issued;
                let diff = (allocation.amount - exact).abs();
                prop_assert!(diff < Decimal::new(1, 2));
            }
        }
    }
}
