//! Investment entity: one investor's position in one SPV.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ids::{DealId, InvestmentId, InvestorId, SpvId};
use crate::types::money::Money;

/// Lifecycle status of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    /// Payment initiated, shares not yet confirmed.
    Pending,
    /// Shares issued and held.
    Active,
    /// Position closed out.
    Exited,
}

/// One investor's confirmed position in one SPV.
///
/// `shares_issued = amount / share_price_at_purchase` at the time of purchase
/// and is immutable once confirmed; payouts accrue into
/// `total_payouts_received` without moving shares. Shares never transfer
/// without a corresponding ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// Unique identifier.
    pub id: InvestmentId,
    /// Owning investor.
    pub investor_id: InvestorId,
    /// The SPV whose shares are held.
    pub spv_id: SpvId,
    /// The underlying deal.
    pub deal_id: DealId,
    /// Principal paid in.
    pub amount: Money,
    /// Shares issued for the principal; fixed at purchase.
    pub shares_issued: Decimal,
    /// Share price locked at purchase time.
    pub share_price_at_purchase: Money,
    /// Lifecycle status.
    pub status: InvestmentStatus,
    /// Purchase confirmation time.
    pub invested_at: DateTime<Utc>,
    /// Running total of payouts received across all runs.
    pub total_payouts_received: Money,
}

impl Investment {
    /// Creates an active investment at the moment of share issuance.
    pub fn new(
        id: InvestmentId,
        investor_id: InvestorId,
        spv_id: SpvId,
        deal_id: DealId,
        amount: Money,
        shares_issued: Decimal,
        share_price: Money,
        invested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            investor_id,
            spv_id,
            deal_id,
            amount,
            shares_issued,
            share_price_at_purchase: share_price,
            status: InvestmentStatus::Active,
            invested_at,
            total_payouts_received: Decimal::ZERO,
        }
    }

    /// Current value of the position at the given share price.
    #[inline]
    pub fn current_value(&self, share_price: Money) -> Money {
        self.shares_issued * share_price
    }

    /// Returns true while the position holds live shares.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }
}
