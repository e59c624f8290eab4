//! # ledger_scheduler: Time-Driven Tasks for the SPV Ledger
//!
//! ## Layer 4 (Schedulers) Role
//!
//! Two independent periodic tasks drive the ledger unattended:
//!
//! - [`SipScheduler`]: converts due systematic-investment-plan installments
//!   into share purchases, at most one installment per plan per tick.
//! - [`PayoutScheduler`]: finds distribution triggers whose date has arrived
//!   and creates/executes payout runs, deduplicated by
//!   `(spv, scheduled_date)`.
//!
//! Each scheduler is an explicit long-lived object with injected store,
//! engine, and notifier dependencies and its own is-a-tick-running flag; a
//! tick still in flight when the timer fires again causes the new tick to be
//! skipped, never queued. Tick failures are logged and retried on the next
//! interval; a scheduler never panics the host process.
//!
//! Tick bodies are exposed as `tick_at(now)` so tests drive them with a
//! deterministic clock.

mod guard;
mod payout;
mod sip;

pub use payout::{PayoutScheduler, PayoutTickReport};
pub use sip::{SipScheduler, SipTickReport};
