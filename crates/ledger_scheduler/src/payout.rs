//! Payout scheduler: fires distribution triggers whose date has arrived.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ledger_core::domain::ScheduledPayout;
use ledger_core::events::Notifier;
use ledger_core::types::{LedgerError, PayoutRunId};
use ledger_engine::PayoutEngine;
use ledger_store::LedgerStore;
use tokio::time::MissedTickBehavior;

use crate::guard::TickGuard;

/// Outcome of one payout scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PayoutTickReport {
    /// Runs created and executed to completion.
    pub executed: usize,
    /// Previously failed or interrupted runs re-executed to completion.
    pub retried: usize,
    /// Triggers skipped because their run already completed.
    pub skipped: usize,
    /// Triggers that errored; retried next tick.
    pub failed: usize,
}

/// Periodic task turning due [`ScheduledPayout`] triggers into payout runs.
///
/// Every trigger is keyed by `(spv, scheduled_date)`: before creating a run
/// the scheduler probes for an existing one under that key, so the same
/// scheduled payout is never triggered twice. An existing run that has not
/// completed is re-executed instead, which resumes it idempotently; one
/// whose holdings snapshot has gone stale while still `pending` is retired
/// and replaced under the same key.
///
/// [`ScheduledPayout`]: ledger_core::domain::ScheduledPayout
pub struct PayoutScheduler<S, N> {
    store: Arc<S>,
    engine: PayoutEngine<S, N>,
    poll_interval: Duration,
    guard: TickGuard,
}

impl<S: LedgerStore, N: Notifier> PayoutScheduler<S, N> {
    /// Creates a scheduler polling every `poll_interval`.
    pub fn new(store: Arc<S>, notifier: Arc<N>, poll_interval: Duration) -> Self {
        Self {
            engine: PayoutEngine::new(store.clone(), notifier),
            store,
            poll_interval,
            guard: TickGuard::default(),
        }
    }

    /// Runs the scheduler loop forever. Tick errors are logged and retried on
    /// the next interval; overlapping ticks are skipped.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            "Payout scheduler started"
        );
        loop {
            interval.tick().await;
            match self.try_tick(Utc::now()) {
                Some(Ok(report)) => {
                    if report != PayoutTickReport::default() {
                        tracing::info!(
                            executed = report.executed,
                            retried = report.retried,
                            skipped = report.skipped,
                            failed = report.failed,
                            "Payout tick finished"
                        );
                    }
                }
                Some(Err(err)) => {
                    tracing::error!(error = %err, "Payout tick aborted; retrying next interval");
                }
                None => {
                    tracing::warn!("Payout tick still running; skipping this interval");
                }
            }
        }
    }

    /// Runs one tick unless one is already in flight.
    pub fn try_tick(&self, now: DateTime<Utc>) -> Option<Result<PayoutTickReport, LedgerError>> {
        let _permit = self.guard.try_acquire()?;
        Some(self.tick_at(now))
    }

    /// One tick: processes every trigger due at `now`, sequentially, so a
    /// given SPV's balances are never mutated by two runs at once.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Result<PayoutTickReport, LedgerError> {
        let due = self.store.due_scheduled_payouts(now.date_naive())?;
        let mut report = PayoutTickReport::default();

        for schedule in due {
            match self
                .store
                .find_run_for_schedule(&schedule.spv_id, schedule.scheduled_date)
            {
                Ok(Some(run)) if run.is_completed() => report.skipped += 1,
                Ok(Some(run)) => match self.engine.execute_payout_run(&run.id) {
                    Ok(_) => report.retried += 1,
                    Err(LedgerError::SnapshotStale { .. }) => {
                        // Shares moved since this run's snapshot was taken;
                        // its allocation basis is unusable. Retire it and
                        // fire the trigger again with a fresh snapshot.
                        match self.replace_stale_run(&run.id, &schedule) {
                            Ok(true) => report.executed += 1,
                            Ok(false) => report.skipped += 1,
                            Err(err) => {
                                report.failed += 1;
                                tracing::warn!(
                                    run = %run.id,
                                    error = %err,
                                    "Stale run replacement failed"
                                );
                            }
                        }
                    }
                    Err(err) => {
                        report.failed += 1;
                        tracing::warn!(run = %run.id, error = %err, "Scheduled run retry failed");
                    }
                },
                Ok(None) => {
                    let created = self.engine.create_scheduled_run(
                        &schedule.spv_id,
                        schedule.payout_type,
                        schedule.amount,
                        schedule.scheduled_date,
                    );
                    match created.and_then(|run| self.engine.execute_payout_run(&run.id)) {
                        Ok(_) => report.executed += 1,
                        Err(err) => {
                            report.failed += 1;
                            tracing::warn!(
                                spv = %schedule.spv_id,
                                date = %schedule.scheduled_date,
                                error = %err,
                                "Scheduled payout failed"
                            );
                        }
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(spv = %schedule.spv_id, error = %err, "Trigger probe failed");
                }
            }
        }
        Ok(report)
    }

    /// Retires a stale pending run and fires its trigger again, creating and
    /// executing a replacement run under the same `(spv, scheduled_date)`
    /// key. Returns `Ok(false)` when the run could not be retired because it
    /// left `pending` in the meantime.
    fn replace_stale_run(
        &self,
        run_id: &PayoutRunId,
        schedule: &ScheduledPayout,
    ) -> Result<bool, LedgerError> {
        if !self.store.supersede_payout_run(run_id)? {
            return Ok(false);
        }
        tracing::info!(run = %run_id, "Stale scheduled run retired; re-firing trigger");
        let replacement = self.engine.create_scheduled_run(
            &schedule.spv_id,
            schedule.payout_type,
            schedule.amount,
            schedule.scheduled_date,
        )?;
        self.engine.execute_payout_run(&replacement.id)?;
        Ok(true)
    }
}
