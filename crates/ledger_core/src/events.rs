//! Notification events emitted by the engines.
//!
//! Delivery (email, webhooks, retries) belongs to an external collaborator;
//! the ledger only hands over events with enough identifiers to render a
//! message. [`LogNotifier`] is the default sink and writes structured logs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ids::{InvestorId, PayoutRunId, PlanId, SpvId};

/// Events the ledger emits toward the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A SIP plan was paused because the target SPV ran out of capacity.
    PlanPaused {
        /// The paused plan.
        plan_id: PlanId,
        /// The subscribing investor.
        investor_id: InvestorId,
        /// The SPV that could not absorb the installment.
        spv_id: SpvId,
        /// The installment that was not charged.
        installment_amount: Decimal,
    },
    /// A payout run settled in full.
    PayoutCompleted {
        /// The completed run.
        run_id: PayoutRunId,
        /// The distributing SPV.
        spv_id: SpvId,
        /// Gross amount distributed.
        total_amount: Decimal,
        /// Number of investments paid.
        investments_paid: usize,
    },
    /// A payout run hit a persistence failure and awaits re-execution.
    PayoutFailed {
        /// The failed run.
        run_id: PayoutRunId,
        /// The distributing SPV.
        spv_id: SpvId,
        /// Description of the failure.
        reason: String,
    },
}

/// Sink for ledger notification events.
///
/// Implementations must not block the caller for long: the engines emit
/// events inline between persistence calls.
pub trait Notifier: Send + Sync {
    /// Delivers one event. Infallible from the ledger's point of view;
    /// delivery problems are the collaborator's to retry.
    fn notify(&self, event: NotificationEvent);
}

/// Notifier that writes each event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: NotificationEvent) {
        match &event {
            NotificationEvent::PlanPaused {
                plan_id, spv_id, ..
            } => {
                tracing::warn!(plan = %plan_id, spv = %spv_id, "SIP plan paused");
            }
            NotificationEvent::PayoutCompleted {
                run_id,
                spv_id,
                total_amount,
                investments_paid,
            } => {
                tracing::info!(
                    run = %run_id,
                    spv = %spv_id,
                    total = %total_amount,
                    investments = investments_paid,
                    "Payout completed"
                );
            }
            NotificationEvent::PayoutFailed {
                run_id,
                spv_id,
                reason,
            } => {
                tracing::error!(run = %run_id, spv = %spv_id, %reason, "Payout failed");
            }
        }
    }
}
