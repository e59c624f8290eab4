//! Domain entities of the SPV ledger.
//!
//! This module provides:
//! - [`Spv`]: the Special Purpose Vehicle holding a deal's assets
//! - [`Investment`]: one investor's position in one SPV
//! - [`PayoutRun`] / [`PayoutLineItem`]: pro-rata disbursement records
//! - [`SipPlan`]: a systematic (recurring) investment plan
//! - [`HoldingsSnapshot`]: the stable cap table a payout computes against
//!
//! Entities are plain data with small invariant-preserving methods; all
//! mutation flows through the share ledger and payout engine, which run
//! inside the store's per-SPV exclusive update scope.

mod investment;
mod payout;
mod sip;
mod snapshot;
mod spv;

pub use investment::{Investment, InvestmentStatus};
pub use payout::{PayoutLineItem, PayoutRun, PayoutStatus, PayoutType, ScheduledPayout};
pub use sip::{SipPlan, SipStatus};
pub use snapshot::{Holding, HoldingsSnapshot};
pub use spv::{Spv, SpvStatus};
