//! In-memory reference implementation of the persistence contract.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::domain::{
    Investment, PayoutLineItem, PayoutRun, PayoutStatus, ScheduledPayout, SipPlan, Spv,
};
use ledger_core::types::money::Money;
use ledger_core::types::{InvestmentId, LedgerError, PayoutRunId, PlanId, SpvId};

use crate::contract::LedgerStore;

#[derive(Default)]
struct Inner {
    spvs: HashMap<SpvId, Spv>,
    investments: BTreeMap<InvestmentId, Investment>,
    runs: HashMap<PayoutRunId, PayoutRun>,
    line_items: BTreeMap<(PayoutRunId, InvestmentId), PayoutLineItem>,
    plans: BTreeMap<PlanId, SipPlan>,
    schedules: Vec<ScheduledPayout>,
}

/// In-process store backed by hash maps.
///
/// Mutation of one SPV is serialised through a per-SPV mutex, mirroring the
/// row-level locking a SQL implementation would use; the inner `RwLock` only
/// protects map structure. Suitable for tests and single-process demos.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    spv_locks: Mutex<HashMap<SpvId, Arc<Mutex<()>>>>,
}

fn poisoned() -> LedgerError {
    LedgerError::Persistence {
        reason: "store lock poisoned".to_string(),
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn spv_lock(&self, id: &SpvId) -> Result<Arc<Mutex<()>>, LedgerError> {
        let mut locks = self.spv_locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(id.clone()).or_default().clone())
    }
}

impl LedgerStore for MemoryStore {
    fn get_spv(&self, id: &SpvId) -> Result<Spv, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .spvs
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("spv", id.as_str()))
    }

    fn insert_spv(&self, spv: Spv) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.spvs.insert(spv.id.clone(), spv);
        Ok(())
    }

    fn update_spv(
        &self,
        id: &SpvId,
        f: &mut dyn FnMut(&mut Spv) -> Result<(), LedgerError>,
    ) -> Result<(), LedgerError> {
        let lock = self.spv_lock(id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        let mut spv = self.get_spv(id)?;
        f(&mut spv)?;

        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.spvs.insert(id.clone(), spv);
        Ok(())
    }

    fn issue_in_spv(
        &self,
        id: &SpvId,
        issue: &mut dyn FnMut(&mut Spv) -> Result<Investment, LedgerError>,
    ) -> Result<Investment, LedgerError> {
        let lock = self.spv_lock(id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        let mut spv = self.get_spv(id)?;
        let investment = issue(&mut spv)?;

        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.spvs.insert(id.clone(), spv);
        inner
            .investments
            .insert(investment.id.clone(), investment.clone());
        Ok(investment)
    }

    fn get_investment(&self, id: &InvestmentId) -> Result<Investment, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .investments
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("investment", id.as_str()))
    }

    fn investments_for_spv(&self, spv_id: &SpvId) -> Result<Vec<Investment>, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .investments
            .values()
            .filter(|inv| &inv.spv_id == spv_id)
            .cloned()
            .collect())
    }

    fn insert_payout_run(&self, run: PayoutRun) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.runs.insert(run.id.clone(), run);
        Ok(())
    }

    fn get_payout_run(&self, id: &PayoutRunId) -> Result<PayoutRun, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .runs
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("payout run", id.as_str()))
    }

    fn set_payout_status(
        &self,
        id: &PayoutRunId,
        status: PayoutStatus,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let run = inner
            .runs
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("payout run", id.as_str()))?;
        if run.status != PayoutStatus::Completed {
            run.status = status;
        }
        Ok(())
    }

    fn try_start_payout_run(&self, id: &PayoutRunId) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let run = inner
            .runs
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("payout run", id.as_str()))?;
        match run.status {
            PayoutStatus::Pending | PayoutStatus::Failed => {
                run.status = PayoutStatus::Processing;
                Ok(true)
            }
            PayoutStatus::Processing | PayoutStatus::Completed => Ok(false),
        }
    }

    fn supersede_payout_run(&self, id: &PayoutRunId) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let run = inner
            .runs
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("payout run", id.as_str()))?;
        if run.status != PayoutStatus::Pending {
            return Ok(false);
        }
        run.status = PayoutStatus::Failed;
        run.scheduled_for = None;
        Ok(true)
    }

    fn find_run_for_schedule(
        &self,
        spv_id: &SpvId,
        scheduled_date: NaiveDate,
    ) -> Result<Option<PayoutRun>, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .runs
            .values()
            .find(|run| &run.spv_id == spv_id && run.scheduled_for == Some(scheduled_date))
            .cloned())
    }

    fn insert_line_item(&self, item: PayoutLineItem) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let key = (item.run_id.clone(), item.investment_id.clone());
        if inner.line_items.contains_key(&key) {
            return Ok(false);
        }
        inner.line_items.insert(key, item);
        Ok(true)
    }

    fn line_items_for_run(
        &self,
        id: &PayoutRunId,
    ) -> Result<Vec<PayoutLineItem>, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .line_items
            .iter()
            .filter(|((run_id, _), _)| run_id == id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn settle_payout_run(
        &self,
        run_id: &PayoutRunId,
        check_and_debit: &mut dyn FnMut(&mut Spv) -> Result<(), LedgerError>,
        payouts: &[(InvestmentId, Money)],
        completed_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let run = self.get_payout_run(run_id)?;
        let lock = self.spv_lock(&run.spv_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        // Status may have moved while waiting on the lock; completed is
        // terminal and must never debit twice.
        if self.get_payout_run(run_id)?.status == PayoutStatus::Completed {
            return Ok(());
        }

        let mut spv = self.get_spv(&run.spv_id)?;
        check_and_debit(&mut spv)?;

        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        for (investment_id, _) in payouts {
            if !inner.investments.contains_key(investment_id) {
                return Err(LedgerError::not_found("investment", investment_id.as_str()));
            }
        }

        inner.spvs.insert(spv.id.clone(), spv);
        for (investment_id, amount) in payouts {
            if let Some(inv) = inner.investments.get_mut(investment_id) {
                inv.total_payouts_received += *amount;
            }
        }
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| LedgerError::not_found("payout run", run_id.as_str()))?;
        run.status = PayoutStatus::Completed;
        run.completed_at = Some(completed_at);
        Ok(())
    }

    fn contribute_in_plan(
        &self,
        plan_id: &PlanId,
        f: &mut dyn FnMut(&mut Spv, &mut SipPlan) -> Result<Option<Investment>, LedgerError>,
    ) -> Result<Option<Investment>, LedgerError> {
        let plan = self.get_sip_plan(plan_id)?;
        let lock = self.spv_lock(&plan.spv_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        let mut spv = self.get_spv(&plan.spv_id)?;
        let mut plan = self.get_sip_plan(plan_id)?;
        let outcome = f(&mut spv, &mut plan)?;

        if let Some(investment) = &outcome {
            let mut inner = self.inner.write().map_err(|_| poisoned())?;
            inner.spvs.insert(spv.id.clone(), spv);
            inner.plans.insert(plan.id.clone(), plan);
            inner
                .investments
                .insert(investment.id.clone(), investment.clone());
        }
        Ok(outcome)
    }

    fn insert_sip_plan(&self, plan: SipPlan) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.plans.insert(plan.id.clone(), plan);
        Ok(())
    }

    fn get_sip_plan(&self, id: &PlanId) -> Result<SipPlan, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .plans
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("sip plan", id.as_str()))
    }

    fn update_sip_plan(&self, plan: &SipPlan) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if !inner.plans.contains_key(&plan.id) {
            return Err(LedgerError::not_found("sip plan", plan.id.as_str()));
        }
        inner.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    fn due_sip_plans(&self, now: DateTime<Utc>) -> Result<Vec<SipPlan>, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .plans
            .values()
            .filter(|plan| plan.is_due(now))
            .cloned()
            .collect())
    }

    fn insert_scheduled_payout(&self, schedule: ScheduledPayout) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.schedules.push(schedule);
        Ok(())
    }

    fn due_scheduled_payouts(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<ScheduledPayout>, LedgerError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .schedules
            .iter()
            .filter(|s| s.scheduled_date <= today)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::domain::{Holding, HoldingsSnapshot, PayoutType};
    use ledger_core::types::DealId;
    use rust_decimal_macros::dec;

    fn seeded_spv(store: &MemoryStore) -> SpvId {
        let id = SpvId::new("SPV001");
        store
            .insert_spv(Spv::new(
                id.clone(),
                DealId::new("DEAL001"),
                dec!(1000),
                dec!(10.00),
            ))
            .unwrap();
        id
    }

    fn investment(id: &str, spv: &SpvId) -> Investment {
        Investment::new(
            InvestmentId::new(id),
            ledger_core::types::InvestorId::new("USR001"),
            spv.clone(),
            DealId::new("DEAL001"),
            dec!(1000.00),
            dec!(100),
            dec!(10.00),
            Utc::now(),
        )
    }

    fn pending_run(id: &str, spv: &SpvId) -> PayoutRun {
        PayoutRun {
            id: PayoutRunId::new(id),
            spv_id: spv.clone(),
            payout_type: PayoutType::Dividend,
            total_amount: dec!(100.00),
            payout_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            status: PayoutStatus::Pending,
            snapshot: HoldingsSnapshot::new(spv.clone(), dec!(100), vec![]),
            created_at: Utc::now(),
            completed_at: None,
            scheduled_for: None,
        }
    }

    #[test]
    fn issue_commits_spv_and_investment_together() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);

        let inv = store
            .issue_in_spv(&spv_id, &mut |spv| {
                spv.issued_shares += dec!(100);
                spv.escrow_balance += dec!(1000.00);
                Ok(investment("INV001", &spv.id))
            })
            .unwrap();

        assert_eq!(store.get_spv(&spv_id).unwrap().issued_shares, dec!(100));
        assert_eq!(store.get_investment(&inv.id).unwrap().amount, dec!(1000.00));
    }

    #[test]
    fn failed_issue_commits_nothing() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);

        let result = store.issue_in_spv(&spv_id, &mut |spv| {
            spv.issued_shares += dec!(100);
            Err(LedgerError::InvalidAmount { amount: dec!(-1) })
        });

        assert!(result.is_err());
        assert_eq!(
            store.get_spv(&spv_id).unwrap().issued_shares,
            rust_decimal::Decimal::ZERO
        );
    }

    #[test]
    fn line_item_key_is_unique() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);
        store.insert_payout_run(pending_run("RUN001", &spv_id)).unwrap();

        let item = PayoutLineItem {
            run_id: PayoutRunId::new("RUN001"),
            investment_id: InvestmentId::new("INV001"),
            shares_at_snapshot: dec!(100),
            amount: dec!(50.00),
        };
        assert!(store.insert_line_item(item.clone()).unwrap());
        assert!(!store.insert_line_item(item).unwrap());
        assert_eq!(
            store
                .line_items_for_run(&PayoutRunId::new("RUN001"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn settlement_debits_accrues_and_completes() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);
        store
            .update_spv(&spv_id, &mut |spv| {
                spv.operating_balance = dec!(500.00);
                Ok(())
            })
            .unwrap();
        store
            .issue_in_spv(&spv_id, &mut |spv| Ok(investment("INV001", &spv.id)))
            .unwrap();
        store.insert_payout_run(pending_run("RUN001", &spv_id)).unwrap();

        let run_id = PayoutRunId::new("RUN001");
        store
            .settle_payout_run(
                &run_id,
                &mut |spv| {
                    spv.operating_balance -= dec!(100.00);
                    spv.total_distributed += dec!(100.00);
                    Ok(())
                },
                &[(InvestmentId::new("INV001"), dec!(100.00))],
                Utc::now(),
            )
            .unwrap();

        let spv = store.get_spv(&spv_id).unwrap();
        assert_eq!(spv.operating_balance, dec!(400.00));
        assert_eq!(spv.total_distributed, dec!(100.00));
        assert_eq!(
            store
                .get_investment(&InvestmentId::new("INV001"))
                .unwrap()
                .total_payouts_received,
            dec!(100.00)
        );
        let run = store.get_payout_run(&run_id).unwrap();
        assert!(run.is_completed());
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn execution_claim_is_exclusive() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);
        store.insert_payout_run(pending_run("RUN001", &spv_id)).unwrap();
        let run_id = PayoutRunId::new("RUN001");

        assert!(store.try_start_payout_run(&run_id).unwrap());
        // Second claimant is refused while the run is processing
        assert!(!store.try_start_payout_run(&run_id).unwrap());

        // A failed run can be reclaimed for retry
        store
            .set_payout_status(&run_id, PayoutStatus::Failed)
            .unwrap();
        assert!(store.try_start_payout_run(&run_id).unwrap());
    }

    #[test]
    fn settling_a_completed_run_changes_nothing() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);
        store
            .update_spv(&spv_id, &mut |spv| {
                spv.operating_balance = dec!(500.00);
                Ok(())
            })
            .unwrap();
        store
            .issue_in_spv(&spv_id, &mut |spv| Ok(investment("INV001", &spv.id)))
            .unwrap();
        store.insert_payout_run(pending_run("RUN001", &spv_id)).unwrap();
        let run_id = PayoutRunId::new("RUN001");

        let mut debit = |spv: &mut Spv| -> Result<(), LedgerError> {
            spv.operating_balance -= dec!(100.00);
            spv.total_distributed += dec!(100.00);
            Ok(())
        };
        let payouts = [(InvestmentId::new("INV001"), dec!(100.00))];
        store
            .settle_payout_run(&run_id, &mut debit, &payouts, Utc::now())
            .unwrap();
        // A second settlement of the same run must not debit again
        store
            .settle_payout_run(&run_id, &mut debit, &payouts, Utc::now())
            .unwrap();

        let spv = store.get_spv(&spv_id).unwrap();
        assert_eq!(spv.operating_balance, dec!(400.00));
        assert_eq!(spv.total_distributed, dec!(100.00));
        assert_eq!(
            store
                .get_investment(&InvestmentId::new("INV001"))
                .unwrap()
                .total_payouts_received,
            dec!(100.00)
        );

        // Completed is terminal: no status write or claim can leave it
        store
            .set_payout_status(&run_id, PayoutStatus::Failed)
            .unwrap();
        assert!(store.get_payout_run(&run_id).unwrap().is_completed());
        assert!(!store.try_start_payout_run(&run_id).unwrap());
    }

    #[test]
    fn superseded_run_releases_its_trigger_key() {
        let store = MemoryStore::new();
        let spv_id = seeded_spv(&store);
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut run = pending_run("RUN001", &spv_id);
        run.scheduled_for = Some(date);
        store.insert_payout_run(run).unwrap();
        let run_id = PayoutRunId::new("RUN001");

        assert!(store.supersede_payout_run(&run_id).unwrap());
        let run = store.get_payout_run(&run_id).unwrap();
        assert_eq!(run.status, PayoutStatus::Failed);
        assert!(run.scheduled_for.is_none());
        assert!(store
            .find_run_for_schedule(&spv_id, date)
            .unwrap()
            .is_none());

        // Only a pending run can be superseded
        assert!(!store.supersede_payout_run(&run_id).unwrap());
    }

    #[test]
    fn due_plans_filters_paused_and_future() {
        use ledger_core::types::ContributionFrequency;
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut due = SipPlan::new(
            PlanId::new("PLAN001"),
            ledger_core::types::InvestorId::new("USR001"),
            SpvId::new("SPV001"),
            DealId::new("DEAL001"),
            dec!(100.00),
            ContributionFrequency::Weekly,
            now - chrono::Duration::days(1),
        );
        let future = SipPlan::new(
            PlanId::new("PLAN002"),
            ledger_core::types::InvestorId::new("USR001"),
            SpvId::new("SPV001"),
            DealId::new("DEAL001"),
            dec!(100.00),
            ContributionFrequency::Weekly,
            now + chrono::Duration::days(1),
        );
        store.insert_sip_plan(due.clone()).unwrap();
        store.insert_sip_plan(future).unwrap();

        assert_eq!(store.due_sip_plans(now).unwrap().len(), 1);

        due.pause();
        store.update_sip_plan(&due).unwrap();
        assert!(store.due_sip_plans(now).unwrap().is_empty());
    }
}
