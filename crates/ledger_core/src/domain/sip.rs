//! Systematic investment plan entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::frequency::ContributionFrequency;
use crate::types::ids::{DealId, InvestorId, PlanId, SpvId};
use crate::types::money::Money;

/// Lifecycle status of a systematic investment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SipStatus {
    /// Contributing on schedule.
    Active,
    /// Suspended; resumable by the investor (or paused on capacity exhaustion).
    Paused,
    /// Terminated by the investor; never resumed.
    Cancelled,
}

/// A recurring contribution plan.
///
/// The scheduler advances `next_due_at` from the previous due date so the
/// schedule never drifts, and processes at most one installment per plan per
/// tick so an outage catches up gradually instead of charging a burst.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ledger_core::domain::SipPlan;
/// use ledger_core::types::{ContributionFrequency, DealId, InvestorId, PlanId, SpvId};
/// use rust_decimal_macros::dec;
///
/// let due = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
/// let mut plan = SipPlan::new(
///     PlanId::new("PLAN001"),
///     InvestorId::new("USR001"),
///     SpvId::new("SPV001"),
///     DealId::new("DEAL001"),
///     dec!(100.00),
///     ContributionFrequency::Weekly,
///     due,
/// );
/// assert!(plan.is_due(due));
///
/// plan.record_contribution();
/// assert_eq!(plan.total_contributed, dec!(100.00));
/// assert!(!plan.is_due(due));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipPlan {
    /// Unique identifier.
    pub id: PlanId,
    /// The subscribing investor.
    pub investor_id: InvestorId,
    /// Target SPV.
    pub spv_id: SpvId,
    /// Target deal.
    pub deal_id: DealId,
    /// Amount contributed per installment.
    pub installment_amount: Money,
    /// Contribution cadence.
    pub frequency: ContributionFrequency,
    /// Next installment's due time; strictly increases on each contribution.
    pub next_due_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: SipStatus,
    /// Lifetime amount contributed through this plan.
    pub total_contributed: Money,
}

impl SipPlan {
    /// Creates an active plan with its first installment due at `first_due_at`.
    pub fn new(
        id: PlanId,
        investor_id: InvestorId,
        spv_id: SpvId,
        deal_id: DealId,
        installment_amount: Money,
        frequency: ContributionFrequency,
        first_due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            investor_id,
            spv_id,
            deal_id,
            installment_amount,
            frequency,
            next_due_at: first_due_at,
            status: SipStatus::Active,
            total_contributed: Decimal::ZERO,
        }
    }

    /// Returns true when the plan is active and an installment is due.
    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == SipStatus::Active && self.next_due_at <= now
    }

    /// Records a successful installment: advances `next_due_at` by one period
    /// from the previous due date and accumulates the contribution total.
    pub fn record_contribution(&mut self) {
        self.next_due_at = self.frequency.next_after(self.next_due_at);
        self.total_contributed += self.installment_amount;
    }

    /// Suspends the plan (investor action or capacity exhaustion).
    #[inline]
    pub fn pause(&mut self) {
        self.status = SipStatus::Paused;
    }
}
