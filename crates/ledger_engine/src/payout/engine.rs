//! Payout run creation, execution, and crash-safe resumption.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ledger_core::domain::{PayoutLineItem, PayoutRun, PayoutStatus, PayoutType};
use ledger_core::events::{NotificationEvent, Notifier};
use ledger_core::types::money::{floor_to_minor, is_positive, Money};
use ledger_core::types::{LedgerError, PayoutRunId, SpvId};
use rust_decimal::Decimal;

use ledger_store::LedgerStore;

use crate::payout::apportion::apportion;
use crate::share_ledger::ShareLedger;

/// Converts gross payout amounts into correct, non-overlapping per-investor
/// disbursements.
///
/// Execution follows `pending -> processing -> completed | failed`. Line
/// items are written one at a time under the unique
/// `(run_id, investment_id)` key; a crash mid-loop leaves the run `failed`
/// with its written items intact, and the next execution resumes past them.
/// Already-written items are logically committed disbursements and are never
/// rolled back.
pub struct PayoutEngine<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S: LedgerStore, N: Notifier> PayoutEngine<S, N> {
    /// Creates an engine over the given store and notification sink.
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Creates a `pending` payout run with a holdings snapshot taken now.
    ///
    /// Fails with `InvalidAmount` for non-positive or sub-cent amounts. For
    /// dividend and distribution payouts, fails with `InsufficientFunds` when
    /// the amount exceeds either the SPV's combined balances or its
    /// undistributed earnings; return of capital intentionally draws down
    /// principal and skips both checks at creation (the non-negative balance
    /// invariant is still enforced at execution).
    pub fn create_payout_run(
        &self,
        spv_id: &SpvId,
        payout_type: PayoutType,
        total_amount: Money,
        payout_date: NaiveDate,
    ) -> Result<PayoutRun, LedgerError> {
        self.create_run_inner(spv_id, payout_type, total_amount, payout_date, None)
    }

    /// Creates a run on behalf of the payout scheduler, stamped with the
    /// trigger's `(spv, scheduled_date)` deduplication key.
    pub fn create_scheduled_run(
        &self,
        spv_id: &SpvId,
        payout_type: PayoutType,
        total_amount: Money,
        scheduled_date: NaiveDate,
    ) -> Result<PayoutRun, LedgerError> {
        self.create_run_inner(
            spv_id,
            payout_type,
            total_amount,
            scheduled_date,
            Some(scheduled_date),
        )
    }

    fn create_run_inner(
        &self,
        spv_id: &SpvId,
        payout_type: PayoutType,
        total_amount: Money,
        payout_date: NaiveDate,
        scheduled_for: Option<NaiveDate>,
    ) -> Result<PayoutRun, LedgerError> {
        if !is_positive(total_amount) || floor_to_minor(total_amount) != total_amount {
            return Err(LedgerError::InvalidAmount {
                amount: total_amount,
            });
        }

        let spv = self.store.get_spv(spv_id)?;
        if !spv.is_active() {
            return Err(LedgerError::SpvClosed { spv: spv.id });
        }

        if !payout_type.is_return_of_capital() {
            if total_amount > spv.total_balance() {
                return Err(LedgerError::InsufficientFunds {
                    spv: spv.id.clone(),
                    requested: total_amount,
                    available: spv.total_balance(),
                });
            }
            if total_amount > spv.undistributed_earnings() {
                return Err(LedgerError::InsufficientFunds {
                    spv: spv.id.clone(),
                    requested: total_amount,
                    available: spv.undistributed_earnings(),
                });
            }
        }

        let snapshot = ShareLedger::new(self.store.clone()).holdings_snapshot(spv_id)?;
        if snapshot.is_empty() {
            return Err(LedgerError::not_found("holdings", spv_id.as_str()));
        }

        let run = PayoutRun {
            id: PayoutRunId::generate(),
            spv_id: spv_id.clone(),
            payout_type,
            total_amount,
            payout_date,
            status: PayoutStatus::Pending,
            snapshot,
            created_at: Utc::now(),
            completed_at: None,
            scheduled_for,
        };
        self.store.insert_payout_run(run.clone())?;

        tracing::info!(
            run = %run.id,
            spv = %spv_id,
            kind = ?payout_type,
            total = %total_amount,
            "Payout run created"
        );
        Ok(run)
    }

    /// Executes (or resumes) a payout run.
    ///
    /// Safe to retry and to race: a `completed` run returns immediately with
    /// no further effects, a `failed` run resumes from the last written line
    /// item, and a run another executor holds (`processing`) is left alone.
    /// The `pending -> processing` transition is an atomic claim, so
    /// concurrent executions of the same run settle exactly once. A
    /// `pending` run is first checked against live issuance and rejected
    /// with `SnapshotStale` if shares moved since its snapshot was taken;
    /// once execution has started, the snapshot is the committed basis and
    /// resumption proceeds against it.
    pub fn execute_payout_run(&self, run_id: &PayoutRunId) -> Result<PayoutRun, LedgerError> {
        let run = self.store.get_payout_run(run_id)?;
        if run.is_completed() {
            tracing::debug!(run = %run.id, "Run already completed; no-op");
            return Ok(run);
        }

        if run.status == PayoutStatus::Pending {
            let spv = self.store.get_spv(&run.spv_id)?;
            if spv.issued_shares != run.snapshot.issued_shares() {
                return Err(LedgerError::SnapshotStale {
                    spv: spv.id,
                    snapshot_issued: run.snapshot.issued_shares(),
                    current_issued: spv.issued_shares,
                });
            }
        }

        if !self.store.try_start_payout_run(run_id)? {
            // Lost the claim: another executor holds the run or has already
            // completed it.
            let run = self.store.get_payout_run(run_id)?;
            tracing::debug!(run = %run.id, status = ?run.status, "Run claimed elsewhere; no-op");
            return Ok(run);
        }

        let allocations = apportion(
            run.total_amount,
            run.snapshot.holdings(),
            run.snapshot.issued_shares(),
        );

        let mut written = 0usize;
        let mut skipped = 0usize;
        for allocation in &allocations {
            let item = PayoutLineItem {
                run_id: run.id.clone(),
                investment_id: allocation.investment_id.clone(),
                shares_at_snapshot: allocation.shares,
                amount: allocation.amount,
            };
            match self.store.insert_line_item(item) {
                Ok(true) => written += 1,
                Ok(false) => skipped += 1,
                Err(err) => return Err(self.fail_run(&run, err)),
            }
        }
        tracing::debug!(run = %run.id, written, skipped, "Line items persisted");

        let payouts: Vec<_> = allocations
            .iter()
            .map(|a| (a.investment_id.clone(), a.amount))
            .collect();
        let total = run.total_amount;
        let payout_type = run.payout_type;
        let settled = self.store.settle_payout_run(
            run_id,
            &mut |spv| {
                if spv.total_balance() - total < Decimal::ZERO {
                    return Err(LedgerError::InsufficientFunds {
                        spv: spv.id.clone(),
                        requested: total,
                        available: spv.total_balance(),
                    });
                }
                // Operating funds first, escrow for the rest
                let from_operating = total.min(spv.operating_balance.max(Decimal::ZERO));
                spv.operating_balance -= from_operating;
                spv.escrow_balance -= total - from_operating;
                // Return of capital reduces principal; it is not a
                // distribution of earnings
                if !payout_type.is_return_of_capital() {
                    spv.total_distributed += total;
                }
                Ok(())
            },
            &payouts,
            Utc::now(),
        );
        if let Err(err) = settled {
            return Err(self.fail_run(&run, err));
        }

        self.notifier.notify(NotificationEvent::PayoutCompleted {
            run_id: run.id.clone(),
            spv_id: run.spv_id.clone(),
            total_amount: run.total_amount,
            investments_paid: allocations.len(),
        });

        self.store.get_payout_run(run_id)
    }

    /// Marks the run `failed`, preserving written line items for resumption,
    /// and emits the failure event.
    fn fail_run(&self, run: &PayoutRun, err: LedgerError) -> LedgerError {
        if let Err(status_err) = self
            .store
            .set_payout_status(&run.id, PayoutStatus::Failed)
        {
            tracing::error!(run = %run.id, error = %status_err, "Could not mark run failed");
        }
        self.notifier.notify(NotificationEvent::PayoutFailed {
            run_id: run.id.clone(),
            spv_id: run.spv_id.clone(),
            reason: err.to_string(),
        });
        err
    }
}
