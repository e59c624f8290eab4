//! Authoritative share issuance and holdings registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledger_core::domain::{Holding, HoldingsSnapshot, Investment, Spv};
use ledger_core::types::money::{floor_to_minor, is_positive, Money};
use ledger_core::types::{DealId, InvestmentId, InvestorId, LedgerError, PlanId, SpvId};
use rust_decimal::Decimal;
use serde::Serialize;

use ledger_store::LedgerStore;

/// One row of a cap table: an investment, its owner, and its ownership share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapTableEntry {
    /// The investment holding the shares.
    pub investment_id: InvestmentId,
    /// The investor behind the investment.
    pub investor_id: InvestorId,
    /// Shares held.
    pub shares: Decimal,
    /// Fraction of issued shares, in [0, 1].
    pub ownership_fraction: Decimal,
}

/// The cap table of an SPV at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapTable {
    /// The SPV the table describes.
    pub spv_id: SpvId,
    /// Issued shares at read time (the fraction denominator).
    pub issued_shares: Decimal,
    /// Authorised share count.
    pub total_shares: Decimal,
    /// Entries ordered by investment id.
    pub entries: Vec<CapTableEntry>,
}

/// Issues shares for `amount` into an SPV record already held under its
/// exclusive update scope. Shared by direct purchases and SIP installments.
fn issue_into(
    spv: &mut Spv,
    investor_id: &InvestorId,
    deal_id: &DealId,
    amount: Money,
) -> Result<Investment, LedgerError> {
    if !spv.is_active() {
        return Err(LedgerError::SpvClosed {
            spv: spv.id.clone(),
        });
    }

    let shares = amount / spv.share_price;
    if spv.issued_shares + shares > spv.total_shares {
        return Err(LedgerError::InsufficientCapacity {
            spv: spv.id.clone(),
            requested_shares: shares,
            available_shares: spv.available_shares(),
        });
    }

    spv.issued_shares += shares;
    spv.escrow_balance += amount;

    Ok(Investment::new(
        InvestmentId::generate(),
        investor_id.clone(),
        spv.id.clone(),
        deal_id.clone(),
        amount,
        shares,
        spv.share_price,
        Utc::now(),
    ))
}

/// Source of truth for ownership fractions.
///
/// All issuance runs inside the store's per-SPV exclusive scope, so
/// `issued_shares <= total_shares` holds under any interleaving: of two
/// simultaneous purchases near capacity, exactly one succeeds.
pub struct ShareLedger<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> ShareLedger<S> {
    /// Creates a ledger over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registers a new SPV at deal funding close.
    pub fn create_spv(&self, spv: Spv) -> Result<(), LedgerError> {
        self.store.insert_spv(spv)
    }

    /// Issues shares for `amount` of principal: `shares = amount / share_price`.
    ///
    /// Fails with `InvalidAmount` for non-positive or sub-cent amounts,
    /// `SpvClosed` for wound-down vehicles, and `InsufficientCapacity` when
    /// the purchase would push issuance past the authorised total. On success
    /// the SPV's `issued_shares` and `escrow_balance` move together with the
    /// new investment record, in one transaction.
    pub fn issue_shares(
        &self,
        spv_id: &SpvId,
        investor_id: &InvestorId,
        deal_id: &DealId,
        amount: Money,
    ) -> Result<Investment, LedgerError> {
        if !is_positive(amount) || floor_to_minor(amount) != amount {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let investor = investor_id.clone();
        let deal = deal_id.clone();
        let investment = self
            .store
            .issue_in_spv(spv_id, &mut |spv| issue_into(spv, &investor, &deal, amount))?;

        tracing::info!(
            spv = %spv_id,
            investor = %investor_id,
            amount = %amount,
            shares = %investment.shares_issued,
            "Shares issued"
        );
        Ok(investment)
    }

    /// Converts a SIP plan's due installment into a share purchase, advancing
    /// the plan in the same transaction so an installment can never
    /// half-apply and a due date can never be charged twice.
    ///
    /// Returns `Ok(None)` without touching anything when the plan is no
    /// longer active or no longer due at `now` (the status is re-read inside
    /// the SPV's exclusive scope, so a cancellation racing the scheduler
    /// wins). Capacity and balance failures propagate like direct purchases.
    pub fn contribute_installment(
        &self,
        plan_id: &PlanId,
        now: DateTime<Utc>,
    ) -> Result<Option<Investment>, LedgerError> {
        let outcome = self.store.contribute_in_plan(plan_id, &mut |spv, plan| {
            if !plan.is_due(now) {
                return Ok(None);
            }
            let investment = issue_into(spv, &plan.investor_id, &plan.deal_id, plan.installment_amount)?;
            plan.record_contribution();
            Ok(Some(investment))
        })?;

        if let Some(investment) = &outcome {
            tracing::info!(
                plan = %plan_id,
                spv = %investment.spv_id,
                amount = %investment.amount,
                "SIP installment contributed"
            );
        }
        Ok(outcome)
    }

    /// Produces the immutable, ordered holdings snapshot payouts compute
    /// against, with `issued_shares` captured for staleness detection.
    pub fn holdings_snapshot(&self, spv_id: &SpvId) -> Result<HoldingsSnapshot, LedgerError> {
        let spv = self.store.get_spv(spv_id)?;
        let holdings = self
            .store
            .investments_for_spv(spv_id)?
            .into_iter()
            .filter(Investment::is_active)
            .map(|inv| Holding {
                investment_id: inv.id,
                shares: inv.shares_issued,
            })
            .collect();
        Ok(HoldingsSnapshot::new(
            spv.id,
            spv.issued_shares,
            holdings,
        ))
    }

    /// Reads the current cap table with per-entry ownership fractions.
    pub fn cap_table(&self, spv_id: &SpvId) -> Result<CapTable, LedgerError> {
        let spv = self.store.get_spv(spv_id)?;
        let mut investments = self.store.investments_for_spv(spv_id)?;
        investments.retain(Investment::is_active);
        investments.sort_by(|a, b| a.id.cmp(&b.id));

        let entries = investments
            .into_iter()
            .map(|inv| {
                let fraction = if spv.issued_shares.is_zero() {
                    Decimal::ZERO
                } else {
                    inv.shares_issued / spv.issued_shares
                };
                CapTableEntry {
                    investment_id: inv.id,
                    investor_id: inv.investor_id,
                    shares: inv.shares_issued,
                    ownership_fraction: fraction,
                }
            })
            .collect();

        Ok(CapTable {
            spv_id: spv.id,
            issued_shares: spv.issued_shares,
            total_shares: spv.total_shares,
            entries,
        })
    }

    /// Records revenue: credits the operating balance and the lifetime total.
    pub fn record_revenue(&self, spv_id: &SpvId, amount: Money) -> Result<(), LedgerError> {
        if !is_positive(amount) {
            return Err(LedgerError::InvalidAmount { amount });
        }
        self.store.update_spv(spv_id, &mut |spv| {
            spv.total_revenue += amount;
            spv.operating_balance += amount;
            Ok(())
        })
    }

    /// Records an expense: debits the operating balance and accumulates the
    /// lifetime total. Fails with `InsufficientFunds` if the combined balance
    /// would go negative.
    pub fn record_expense(&self, spv_id: &SpvId, amount: Money) -> Result<(), LedgerError> {
        if !is_positive(amount) {
            return Err(LedgerError::InvalidAmount { amount });
        }
        self.store.update_spv(spv_id, &mut |spv| {
            if spv.total_balance() - amount < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    spv: spv.id.clone(),
                    requested: amount,
                    available: spv.total_balance(),
                });
            }
            spv.total_expenses += amount;
            spv.operating_balance -= amount;
            Ok(())
        })
    }
}
