//! The scheduler loops under the tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use ledger_core::domain::{SipPlan, Spv};
use ledger_core::events::{NotificationEvent, Notifier};
use ledger_core::types::{ContributionFrequency, DealId, InvestorId, PlanId, SpvId};
use ledger_scheduler::SipScheduler;
use ledger_store::{LedgerStore, MemoryStore};
use rust_decimal_macros::dec;

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<NotificationEvent>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, event: NotificationEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[tokio::test(start_paused = true)]
async fn sip_loop_contributes_due_installments() {
    let store = Arc::new(MemoryStore::new());
    let spv_id = SpvId::new("SPV001");
    store
        .insert_spv(Spv::new(
            spv_id.clone(),
            DealId::new("DEAL001"),
            dec!(1000),
            dec!(10.00),
        ))
        .unwrap();
    let plan_id = PlanId::new("PLAN001");
    store
        .insert_sip_plan(SipPlan::new(
            plan_id.clone(),
            InvestorId::new("USR001"),
            spv_id.clone(),
            DealId::new("DEAL001"),
            dec!(100.00),
            ContributionFrequency::Weekly,
            Utc::now() - chrono::Duration::days(1),
        ))
        .unwrap();

    let scheduler = SipScheduler::new(
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        Duration::from_secs(60),
    );
    let handle = tokio::spawn(scheduler.run());

    // First interval tick fires immediately; give the task a chance to run it
    tokio::time::advance(Duration::from_millis(1)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    handle.abort();

    let plan = store.get_sip_plan(&plan_id).unwrap();
    assert_eq!(plan.total_contributed, dec!(100.00));
    assert_eq!(store.get_spv(&spv_id).unwrap().issued_shares, dec!(10));
}
