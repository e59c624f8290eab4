//! Special Purpose Vehicle entity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ids::{DealId, SpvId};
use crate::types::money::Money;

/// Lifecycle status of an SPV.
///
/// SPVs are never deleted; a wound-down vehicle transitions to `Closed` and
/// its audit records remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpvStatus {
    /// Accepting issuance and payouts.
    Active,
    /// Wound down; no further issuance or payouts.
    Closed,
}

/// The Special Purpose Vehicle holding a deal's assets.
///
/// Balance fields are owned exclusively by this record: the share ledger
/// credits escrow on issuance, the payout engine debits balances on
/// distribution. Both run inside the store's per-SPV exclusive scope, so
/// `issued_shares <= total_shares` and `escrow + operating >= 0` hold across
/// any interleaving.
///
/// # Examples
///
/// ```
/// use ledger_core::domain::Spv;
/// use ledger_core::types::{DealId, SpvId};
/// use rust_decimal_macros::dec;
///
/// let spv = Spv::new(
///     SpvId::new("SPV001"),
///     DealId::new("DEAL001"),
///     dec!(1000),
///     dec!(10.00),
/// );
/// assert_eq!(spv.available_shares(), dec!(1000));
/// assert_eq!(spv.total_balance(), dec!(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spv {
    /// Unique identifier.
    pub id: SpvId,
    /// The deal this vehicle funds.
    pub deal_id: DealId,
    /// Authorised share count; issuance can never exceed it.
    pub total_shares: Decimal,
    /// Shares issued to date.
    pub issued_shares: Decimal,
    /// Price per share for issuance.
    pub share_price: Money,
    /// Investor principal held in escrow.
    pub escrow_balance: Money,
    /// Operating funds (accumulated revenue less operating outflows).
    pub operating_balance: Money,
    /// Lifetime revenue recorded for the vehicle.
    pub total_revenue: Money,
    /// Lifetime expenses recorded for the vehicle.
    pub total_expenses: Money,
    /// Lifetime amount distributed to investors.
    pub total_distributed: Money,
    /// Lifecycle status.
    pub status: SpvStatus,
}

impl Spv {
    /// Creates an active SPV with zero balances and no shares issued.
    pub fn new(id: SpvId, deal_id: DealId, total_shares: Decimal, share_price: Money) -> Self {
        Self {
            id,
            deal_id,
            total_shares,
            issued_shares: Decimal::ZERO,
            share_price,
            escrow_balance: Decimal::ZERO,
            operating_balance: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            total_distributed: Decimal::ZERO,
            status: SpvStatus::Active,
        }
    }

    /// Shares still available for issuance.
    #[inline]
    pub fn available_shares(&self) -> Decimal {
        self.total_shares - self.issued_shares
    }

    /// Combined escrow and operating balance.
    #[inline]
    pub fn total_balance(&self) -> Money {
        self.escrow_balance + self.operating_balance
    }

    /// Lifetime earnings: revenue less expenses.
    #[inline]
    pub fn retained_earnings(&self) -> Money {
        self.total_revenue - self.total_expenses
    }

    /// Earnings not yet distributed; the ceiling for dividend and
    /// distribution payouts (return of capital is exempt).
    #[inline]
    pub fn undistributed_earnings(&self) -> Money {
        self.retained_earnings() - self.total_distributed
    }

    /// Returns true while the vehicle accepts issuance and payouts.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == SpvStatus::Active
    }
}
