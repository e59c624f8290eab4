//! Holdings snapshot: the stable cap table a payout computes against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ids::{InvestmentId, SpvId};

/// One investment's share count inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// The investment holding the shares.
    pub investment_id: InvestmentId,
    /// Shares held at snapshot time.
    pub shares: Decimal,
}

/// Immutable, ordered cap table of an SPV at a logical point in time.
///
/// Payout computation must never read live holdings: shares issued while a
/// run executes would change denominators mid-loop. The snapshot captures
/// `issued_shares` so execution can detect staleness, and orders holdings by
/// investment id so resumption walks the same sequence every time.
///
/// # Examples
///
/// ```
/// use ledger_core::domain::{Holding, HoldingsSnapshot};
/// use ledger_core::types::{InvestmentId, SpvId};
/// use rust_decimal_macros::dec;
///
/// let snapshot = HoldingsSnapshot::new(
///     SpvId::new("SPV001"),
///     dec!(800),
///     vec![
///         Holding { investment_id: InvestmentId::new("INV002"), shares: dec!(300) },
///         Holding { investment_id: InvestmentId::new("INV001"), shares: dec!(500) },
///     ],
/// );
/// // Ordered by investment id regardless of input order
/// assert_eq!(snapshot.holdings()[0].investment_id.as_str(), "INV001");
/// assert_eq!(snapshot.total_shares_held(), dec!(800));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    spv_id: SpvId,
    issued_shares: Decimal,
    holdings: Vec<Holding>,
}

impl HoldingsSnapshot {
    /// Creates a snapshot, sorting holdings by investment id.
    pub fn new(spv_id: SpvId, issued_shares: Decimal, mut holdings: Vec<Holding>) -> Self {
        holdings.sort_by(|a, b| a.investment_id.cmp(&b.investment_id));
        Self {
            spv_id,
            issued_shares,
            holdings,
        }
    }

    /// The SPV this snapshot was taken from.
    #[inline]
    pub fn spv_id(&self) -> &SpvId {
        &self.spv_id
    }

    /// Issued shares of the SPV at snapshot time; the payout denominator.
    #[inline]
    pub fn issued_shares(&self) -> Decimal {
        self.issued_shares
    }

    /// The holdings, ordered by investment id.
    #[inline]
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Sum of shares across all holdings.
    pub fn total_shares_held(&self) -> Decimal {
        self.holdings.iter().map(|h| h.shares).sum()
    }

    /// Returns true when the snapshot contains no holdings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
