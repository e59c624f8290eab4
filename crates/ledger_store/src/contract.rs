//! The persistence contract.

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::domain::{
    Investment, PayoutLineItem, PayoutRun, PayoutStatus, ScheduledPayout, SipPlan, Spv,
};
use ledger_core::types::money::Money;
use ledger_core::types::{InvestmentId, LedgerError, PayoutRunId, PlanId, SpvId};

/// Storage contract for the share ledger, payout engine, and schedulers.
///
/// Every method is one transaction. Methods taking a closure run it under the
/// SPV's exclusive update scope (single writer per SPV); the closure sees the
/// current record, and its mutations are committed only when it returns `Ok`.
/// On `Err` nothing is persisted.
///
/// Methods are synchronous: callers living in async tasks treat each call as
/// a suspension point at the task level, and implementations are expected to
/// complete quickly or use their own pooling.
pub trait LedgerStore: Send + Sync {
    // --- SPVs ---

    /// Loads an SPV or fails with `NotFound`.
    fn get_spv(&self, id: &SpvId) -> Result<Spv, LedgerError>;

    /// Creates an SPV record.
    fn insert_spv(&self, spv: Spv) -> Result<(), LedgerError>;

    /// Atomic read-modify-write of one SPV under its exclusive update scope.
    fn update_spv(
        &self,
        id: &SpvId,
        f: &mut dyn FnMut(&mut Spv) -> Result<(), LedgerError>,
    ) -> Result<(), LedgerError>;

    /// Issuance transaction: runs `issue` against the SPV under its exclusive
    /// scope and, on success, commits the mutated SPV together with the
    /// investment record the closure produced.
    fn issue_in_spv(
        &self,
        id: &SpvId,
        issue: &mut dyn FnMut(&mut Spv) -> Result<Investment, LedgerError>,
    ) -> Result<Investment, LedgerError>;

    // --- Investments ---

    /// Loads an investment or fails with `NotFound`.
    fn get_investment(&self, id: &InvestmentId) -> Result<Investment, LedgerError>;

    /// All investments holding shares of one SPV, ordered by investment id.
    fn investments_for_spv(&self, spv_id: &SpvId) -> Result<Vec<Investment>, LedgerError>;

    // --- Payout runs ---

    /// Creates a payout run (with its embedded snapshot).
    fn insert_payout_run(&self, run: PayoutRun) -> Result<(), LedgerError>;

    /// Loads a payout run or fails with `NotFound`.
    fn get_payout_run(&self, id: &PayoutRunId) -> Result<PayoutRun, LedgerError>;

    /// Transitions a run's status field. `completed` is terminal: a
    /// transition away from it is ignored.
    fn set_payout_status(
        &self,
        id: &PayoutRunId,
        status: PayoutStatus,
    ) -> Result<(), LedgerError>;

    /// Atomically claims a run for execution.
    ///
    /// Flips `pending` or `failed` to `processing` and returns `true`.
    /// Returns `false` when the run is already `processing` (another
    /// executor holds it) or `completed`, so concurrent executions of the
    /// same run cannot both settle.
    fn try_start_payout_run(&self, id: &PayoutRunId) -> Result<bool, LedgerError>;

    /// Retires a `pending` run whose snapshot can no longer be used,
    /// marking it `failed` and releasing its scheduled trigger key so a
    /// replacement run can be created under the same key. Returns `false`
    /// without mutation when the run has already left `pending`.
    fn supersede_payout_run(&self, id: &PayoutRunId) -> Result<bool, LedgerError>;

    /// Finds the run created for a scheduled trigger, if any.
    ///
    /// This is the payout scheduler's deduplication probe for the
    /// `(spv_id, scheduled_date)` key.
    fn find_run_for_schedule(
        &self,
        spv_id: &SpvId,
        scheduled_date: NaiveDate,
    ) -> Result<Option<PayoutRun>, LedgerError>;

    /// Inserts a line item under the unique `(run_id, investment_id)`
    /// constraint. Returns `Ok(false)` when the key already exists, so
    /// resumption can skip logically committed disbursements.
    fn insert_line_item(&self, item: PayoutLineItem) -> Result<bool, LedgerError>;

    /// All line items written for a run, ordered by investment id.
    fn line_items_for_run(
        &self,
        id: &PayoutRunId,
    ) -> Result<Vec<PayoutLineItem>, LedgerError>;

    /// Settlement transaction: runs `check_and_debit` against the SPV under
    /// its exclusive scope and, on success, commits the mutated SPV, accrues
    /// each `(investment, amount)` onto `total_payouts_received`, and flips
    /// the run to `completed` with the given timestamp.
    ///
    /// The run's status is re-read inside the exclusive scope: settling a
    /// run that is already `completed` is a no-op, so a run can never debit
    /// its SPV twice.
    fn settle_payout_run(
        &self,
        run_id: &PayoutRunId,
        check_and_debit: &mut dyn FnMut(&mut Spv) -> Result<(), LedgerError>,
        payouts: &[(InvestmentId, Money)],
        completed_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    // --- SIP plans ---

    /// Creates a plan record.
    fn insert_sip_plan(&self, plan: SipPlan) -> Result<(), LedgerError>;

    /// Contribution transaction: runs `f` against the plan's SPV and the plan
    /// itself under the SPV's exclusive scope. On `Ok(Some(investment))` the
    /// mutated SPV, the mutated plan, and the new investment commit together,
    /// so an installment can never half-apply. `Ok(None)` commits nothing and
    /// signals that the closure skipped the contribution.
    fn contribute_in_plan(
        &self,
        plan_id: &PlanId,
        f: &mut dyn FnMut(&mut Spv, &mut SipPlan) -> Result<Option<Investment>, LedgerError>,
    ) -> Result<Option<Investment>, LedgerError>;

    /// Loads a plan or fails with `NotFound`.
    fn get_sip_plan(&self, id: &PlanId) -> Result<SipPlan, LedgerError>;

    /// Persists the full plan record (status, due date, totals).
    fn update_sip_plan(&self, plan: &SipPlan) -> Result<(), LedgerError>;

    /// Active plans whose `next_due_at` is at or before `now`, ordered by id.
    fn due_sip_plans(&self, now: DateTime<Utc>) -> Result<Vec<SipPlan>, LedgerError>;

    // --- Scheduled payouts ---

    /// Registers a distribution trigger.
    fn insert_scheduled_payout(&self, schedule: ScheduledPayout) -> Result<(), LedgerError>;

    /// Triggers whose `scheduled_date` is at or before `today`.
    fn due_scheduled_payouts(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<ScheduledPayout>, LedgerError>;
}
