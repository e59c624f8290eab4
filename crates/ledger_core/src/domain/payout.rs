//! Payout run, line item, and scheduled-payout records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::snapshot::HoldingsSnapshot;
use crate::types::ids::{InvestmentId, PayoutRunId, SpvId};
use crate::types::money::Money;

/// Kind of disbursement a payout run makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutType {
    /// Profit distribution per share out of earnings.
    Dividend,
    /// Proceeds distribution (e.g. asset sale) out of earnings.
    Distribution,
    /// Return of investor principal; may draw down escrow beyond earnings.
    ReturnOfCapital,
}

impl PayoutType {
    /// Returns true for payouts exempt from the earnings-funded checks.
    #[inline]
    pub fn is_return_of_capital(&self) -> bool {
        matches!(self, PayoutType::ReturnOfCapital)
    }
}

/// State machine of a payout run: `Pending -> Processing -> Completed | Failed`.
///
/// A `Failed` run keeps its already-written line items; re-execution resumes
/// past them. A `Completed` run is a permanent audit record and re-execution
/// is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Created, not yet executed.
    Pending,
    /// Execution in progress (or interrupted mid-loop).
    Processing,
    /// All line items written and balances settled.
    Completed,
    /// Execution hit a persistence failure; safe to re-execute.
    Failed,
}

/// A pro-rata disbursement of a gross amount across an SPV's cap table.
///
/// The run embeds the holdings snapshot taken at creation time; execution
/// computes against the snapshot, never live holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRun {
    /// Unique identifier.
    pub id: PayoutRunId,
    /// The SPV being distributed from.
    pub spv_id: SpvId,
    /// Disbursement kind.
    pub payout_type: PayoutType,
    /// Gross amount to distribute; line items sum to this exactly.
    pub total_amount: Money,
    /// Value date of the payout.
    pub payout_date: NaiveDate,
    /// Current state-machine position.
    pub status: PayoutStatus,
    /// Cap table captured at creation time.
    pub snapshot: HoldingsSnapshot,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time, once reached.
    pub completed_at: Option<DateTime<Utc>>,
    /// Scheduled trigger date when the run came from the payout scheduler.
    ///
    /// Together with `spv_id` this is the deduplication key that stops the
    /// scheduler from triggering the same scheduled payout twice.
    pub scheduled_for: Option<NaiveDate>,
}

impl PayoutRun {
    /// Returns true once the run is a permanent, settled audit record.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == PayoutStatus::Completed
    }
}

/// One investment's disbursement within a payout run.
///
/// Immutable after creation; `(run_id, investment_id)` is unique and serves
/// as the idempotency key for crash-safe resumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutLineItem {
    /// The owning run.
    pub run_id: PayoutRunId,
    /// The investment being paid.
    pub investment_id: InvestmentId,
    /// Shares held at the run's snapshot time.
    pub shares_at_snapshot: Decimal,
    /// Disbursed amount in minor-unit precision.
    pub amount: Money,
}

/// A configured distribution trigger awaiting its date.
///
/// The payout scheduler scans these records each tick; a trigger whose
/// `scheduled_date` has arrived becomes a payout run unless one already
/// exists for `(spv_id, scheduled_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayout {
    /// The SPV to distribute from.
    pub spv_id: SpvId,
    /// Disbursement kind.
    pub payout_type: PayoutType,
    /// Gross amount to distribute.
    pub amount: Money,
    /// Date the trigger fires.
    pub scheduled_date: NaiveDate,
}
