//! Pro-rata payout computation and execution.
//!
//! [`apportion`] is the pure allocation kernel; [`PayoutEngine`] wraps it in
//! the crash-safe run state machine and the settlement transaction.

mod apportion;
mod engine;

pub use apportion::{apportion, Allocation};
pub use engine::PayoutEngine;
