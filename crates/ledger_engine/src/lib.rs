//! # ledger_engine: Share Ledger and Payout Engine
//!
//! ## Layer 3 (Kernel) Role
//!
//! The hard core of the platform:
//!
//! - [`ShareLedger`]: authoritative issuance and holdings registry. Issues
//!   shares against an SPV's capacity, credits escrow, and produces the
//!   stable holdings snapshots payouts compute against.
//! - [`PayoutEngine`]: converts a gross payout amount into per-investor
//!   disbursements by the largest-remainder method, with a crash-safe
//!   `pending -> processing -> completed | failed` state machine. Re-executing
//!   a completed run is a no-op; re-executing an interrupted run resumes past
//!   line items already written under the `(run_id, investment_id)` key, so a
//!   crashed job never double-pays and never loses money.
//!
//! All money math is fixed-point (`rust_decimal`); the sum of a run's line
//! items equals its gross amount exactly, whatever the share distribution.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            ledger_engine (L3)               │
//! ├─────────────────────────────────────────────┤
//! │  share_ledger  - issuance, snapshots,       │
//! │                  cap table, revenue/expense │
//! │  payout        - apportionment, run state   │
//! │                  machine, settlement        │
//! └─────────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────────┐
//! │            ledger_store (L2)                │
//! │  per-SPV exclusive transactions             │
//! └─────────────────────────────────────────────┘
//! ```

mod payout;
mod share_ledger;

pub use payout::{apportion, Allocation, PayoutEngine};
pub use share_ledger::{CapTable, CapTableEntry, ShareLedger};
