//! # ledger_store: Persistence Contract for the SPV Ledger
//!
//! ## Layer 2 (Persistence) Role
//!
//! This crate defines [`LedgerStore`], the contract the engines and schedulers
//! rely on, and provides [`MemoryStore`], the in-process reference
//! implementation used in tests and the demo server wiring.
//!
//! The contract encodes the two transaction boundaries the ledger needs:
//!
//! - **Issuance** ([`LedgerStore::issue_in_spv`]): read-modify-write of one
//!   SPV's balance and issuance fields plus creation of the investment record,
//!   committed together under the SPV's exclusive update scope.
//! - **Settlement** ([`LedgerStore::settle_payout_run`]): debit of the SPV,
//!   accrual onto each paid investment, and the run's transition to
//!   `completed`, committed together under the same scope.
//!
//! Line-item creation carries a unique `(run_id, investment_id)` constraint so
//! an interrupted payout execution can resume without double-paying.
//!
//! A SQL-backed implementation is an external collaborator: it maps each trait
//! method onto one transaction with row-level locking on the SPV.

mod contract;
mod memory;

pub use contract::LedgerStore;
pub use memory::MemoryStore;
