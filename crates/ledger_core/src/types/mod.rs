//! Core value types for the SPV ledger.
//!
//! This module provides:
//! - [`ids`]: newtype identifiers (`SpvId`, `InvestorId`, ...)
//! - [`money`]: fixed-point money helpers built on `rust_decimal`
//! - [`ContributionFrequency`]: recurring-contribution schedules
//! - [`LedgerError`]: the error taxonomy shared by every layer

pub mod error;
pub mod frequency;
pub mod ids;
pub mod money;

pub use error::LedgerError;
pub use frequency::ContributionFrequency;
pub use ids::{DealId, InvestmentId, InvestorId, PayoutRunId, PlanId, SpvId};
pub use money::Money;
