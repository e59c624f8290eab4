//! Systematic-investment-plan scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ledger_core::domain::SipStatus;
use ledger_core::events::{NotificationEvent, Notifier};
use ledger_core::types::{LedgerError, PlanId};
use ledger_engine::ShareLedger;
use ledger_store::LedgerStore;
use tokio::time::MissedTickBehavior;

use crate::guard::TickGuard;

/// Outcome of one SIP scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SipTickReport {
    /// Installments contributed.
    pub contributed: usize,
    /// Plans paused on capacity exhaustion (or a closed SPV).
    pub paused: usize,
    /// Due plans skipped because their status changed before processing.
    pub skipped: usize,
    /// Plans hit by transient failures; untouched and retried next tick.
    pub failed: usize,
}

/// Periodic task converting due SIP installments into share purchases.
///
/// Each tick processes its batch sequentially and charges at most one
/// installment per plan, so a plan many periods behind catches up one period
/// per tick instead of bursting. A plan that no longer fits its SPV's share
/// capacity is paused and the notification collaborator is told; transient
/// failures leave the plan untouched so the same due installment retries on
/// the next tick.
pub struct SipScheduler<S, N> {
    store: Arc<S>,
    ledger: ShareLedger<S>,
    notifier: Arc<N>,
    poll_interval: Duration,
    guard: TickGuard,
}

impl<S: LedgerStore, N: Notifier> SipScheduler<S, N> {
    /// Creates a scheduler polling every `poll_interval`.
    pub fn new(store: Arc<S>, notifier: Arc<N>, poll_interval: Duration) -> Self {
        Self {
            ledger: ShareLedger::new(store.clone()),
            store,
            notifier,
            poll_interval,
            guard: TickGuard::default(),
        }
    }

    /// Runs the scheduler loop forever. Tick errors are logged and retried on
    /// the next interval; overlapping ticks are skipped.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_secs = self.poll_interval.as_secs(), "SIP scheduler started");
        loop {
            interval.tick().await;
            match self.try_tick(Utc::now()) {
                Some(Ok(report)) => {
                    if report != SipTickReport::default() {
                        tracing::info!(
                            contributed = report.contributed,
                            paused = report.paused,
                            skipped = report.skipped,
                            failed = report.failed,
                            "SIP tick finished"
                        );
                    }
                }
                Some(Err(err)) => {
                    tracing::error!(error = %err, "SIP tick aborted; retrying next interval");
                }
                None => {
                    tracing::warn!("SIP tick still running; skipping this interval");
                }
            }
        }
    }

    /// Runs one tick unless one is already in flight.
    pub fn try_tick(&self, now: DateTime<Utc>) -> Option<Result<SipTickReport, LedgerError>> {
        let _permit = self.guard.try_acquire()?;
        Some(self.tick_at(now))
    }

    /// One tick: processes every plan due at `now`, one installment each.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Result<SipTickReport, LedgerError> {
        let due = self.store.due_sip_plans(now)?;
        let mut report = SipTickReport::default();

        for plan in due {
            // Status and due date are re-checked inside the contribution
            // transaction; a cancellation racing this tick wins.
            match self.ledger.contribute_installment(&plan.id, now) {
                Ok(Some(_)) => report.contributed += 1,
                Ok(None) => report.skipped += 1,
                Err(
                    err @ (LedgerError::InsufficientCapacity { .. }
                    | LedgerError::SpvClosed { .. }),
                ) => {
                    self.pause_plan(&plan.id, &err, &mut report);
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(plan = %plan.id, error = %err, "SIP contribution failed; will retry");
                }
            }
        }
        Ok(report)
    }

    fn pause_plan(&self, plan_id: &PlanId, cause: &LedgerError, report: &mut SipTickReport) {
        match self.store.get_sip_plan(plan_id) {
            Ok(mut plan) => {
                // A cancellation (or another pause) landing between the
                // contribution attempt and this re-read wins.
                if plan.status != SipStatus::Active {
                    report.skipped += 1;
                    tracing::debug!(plan = %plan_id, status = ?plan.status, "Plan no longer active; not pausing");
                    return;
                }
                plan.pause();
                if let Err(err) = self.store.update_sip_plan(&plan) {
                    report.failed += 1;
                    tracing::error!(plan = %plan_id, error = %err, "Could not pause plan");
                    return;
                }
                report.paused += 1;
                tracing::warn!(plan = %plan_id, cause = %cause, "SIP plan paused");
                self.notifier.notify(NotificationEvent::PlanPaused {
                    plan_id: plan.id,
                    investor_id: plan.investor_id,
                    spv_id: plan.spv_id,
                    installment_amount: plan.installment_amount,
                });
            }
            Err(err) => {
                report.failed += 1;
                tracing::error!(plan = %plan_id, error = %err, "Could not load plan to pause");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ledger_core::domain::{SipPlan, Spv};
    use ledger_core::types::{ContributionFrequency, DealId, InvestorId, PlanId, SpvId};
    use ledger_store::MemoryStore;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<NotificationEvent>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: NotificationEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn scheduler_with_plan(
        total_shares: rust_decimal::Decimal,
        first_due: DateTime<Utc>,
    ) -> (
        SipScheduler<MemoryStore, RecordingNotifier>,
        Arc<MemoryStore>,
        PlanId,
    ) {
        let store = Arc::new(MemoryStore::new());
        let spv_id = SpvId::new("SPV001");
        store
            .insert_spv(Spv::new(
                spv_id.clone(),
                DealId::new("DEAL001"),
                total_shares,
                dec!(10.00),
            ))
            .unwrap();
        let plan = SipPlan::new(
            PlanId::new("PLAN001"),
            InvestorId::new("USR001"),
            spv_id,
            DealId::new("DEAL001"),
            dec!(100.00),
            ContributionFrequency::Weekly,
            first_due,
        );
        let plan_id = plan.id.clone();
        store.insert_sip_plan(plan).unwrap();
        let scheduler = SipScheduler::new(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            Duration::from_secs(60),
        );
        (scheduler, store, plan_id)
    }

    #[test]
    fn due_plan_contributes_once_per_tick() {
        let (scheduler, store, plan_id) = scheduler_with_plan(dec!(1000), now());

        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.contributed, 1);

        let plan = store.get_sip_plan(&plan_id).unwrap();
        assert_eq!(plan.total_contributed, dec!(100.00));
        assert!(plan.next_due_at > now());

        // Same tick again: nothing further is due
        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.contributed, 0);
    }

    #[test]
    fn ten_periods_behind_catches_up_one_per_tick() {
        let first_due = now() - chrono::Duration::weeks(10) + chrono::Duration::hours(1);
        let (scheduler, store, plan_id) = scheduler_with_plan(dec!(100_000), first_due);

        for tick in 1..=10 {
            let report = scheduler.tick_at(now()).unwrap();
            assert_eq!(report.contributed, 1, "tick {}", tick);
            let plan = store.get_sip_plan(&plan_id).unwrap();
            assert_eq!(
                plan.total_contributed,
                dec!(100.00) * rust_decimal::Decimal::from(tick)
            );
            assert_eq!(plan.next_due_at, first_due + chrono::Duration::weeks(tick));
        }

        // Caught up: the eleventh tick charges nothing
        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.contributed, 0);
    }

    #[test]
    fn capacity_exhaustion_pauses_plan_and_issues_no_shares() {
        // 5 shares of capacity; a 100.00 installment wants 10 shares
        let (scheduler, store, plan_id) = scheduler_with_plan(dec!(5), now());

        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.paused, 1);
        assert_eq!(report.contributed, 0);

        let plan = store.get_sip_plan(&plan_id).unwrap();
        assert_eq!(plan.status, ledger_core::domain::SipStatus::Paused);
        assert_eq!(plan.total_contributed, dec!(0));

        let spv = store.get_spv(&SpvId::new("SPV001")).unwrap();
        assert_eq!(spv.issued_shares, dec!(0));

        let events = scheduler.notifier.0.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(NotificationEvent::PlanPaused { .. })
        ));
    }

    #[test]
    fn cancellation_racing_the_tick_wins() {
        let (scheduler, store, plan_id) = scheduler_with_plan(dec!(1000), now());

        // Cancelled after the due scan would have picked it up
        let mut plan = store.get_sip_plan(&plan_id).unwrap();
        plan.status = ledger_core::domain::SipStatus::Cancelled;
        store.update_sip_plan(&plan).unwrap();

        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.contributed, 0);
        assert_eq!(store.get_spv(&SpvId::new("SPV001")).unwrap().issued_shares, dec!(0));
    }

    #[test]
    fn pause_does_not_overwrite_a_cancelled_plan() {
        // 5 shares of capacity so a contribution attempt would pause
        let (scheduler, store, plan_id) = scheduler_with_plan(dec!(5), now());

        // Cancellation lands between the capacity failure and the pause
        let mut plan = store.get_sip_plan(&plan_id).unwrap();
        plan.status = SipStatus::Cancelled;
        store.update_sip_plan(&plan).unwrap();

        let mut report = SipTickReport::default();
        let cause = LedgerError::InsufficientCapacity {
            spv: SpvId::new("SPV001"),
            requested_shares: dec!(10),
            available_shares: dec!(5),
        };
        scheduler.pause_plan(&plan_id, &cause, &mut report);

        assert_eq!(report.paused, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            store.get_sip_plan(&plan_id).unwrap().status,
            SipStatus::Cancelled
        );
        assert!(scheduler.notifier.0.lock().unwrap().is_empty());
    }

    #[test]
    fn transient_failure_leaves_plan_untouched() {
        let store = Arc::new(MemoryStore::new());
        // Plan references an SPV that does not exist yet
        let plan = SipPlan::new(
            PlanId::new("PLAN001"),
            InvestorId::new("USR001"),
            SpvId::new("SPV404"),
            DealId::new("DEAL001"),
            dec!(100.00),
            ContributionFrequency::Weekly,
            now(),
        );
        store.insert_sip_plan(plan.clone()).unwrap();
        let scheduler = SipScheduler::new(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            Duration::from_secs(60),
        );

        let report = scheduler.tick_at(now()).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(store.get_sip_plan(&plan.id).unwrap(), plan);
    }

    #[test]
    fn overlapping_tick_is_skipped() {
        let (scheduler, _store, _plan_id) = scheduler_with_plan(dec!(1000), now());

        let _permit = scheduler.guard.try_acquire().unwrap();
        assert!(scheduler.try_tick(now()).is_none());
        drop(_permit);
        assert!(scheduler.try_tick(now()).is_some());
    }
}
