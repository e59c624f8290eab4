//! Ledger error taxonomy.
//!
//! Four categories drive the handling rules:
//! - validation errors reject before any mutation (`InvalidAmount`);
//! - business-rule errors mutate nothing and are safe to retry once the
//!   precondition is corrected (`InsufficientFunds`, `InsufficientCapacity`,
//!   `SnapshotStale`, `SpvClosed`);
//! - persistence errors are transient and retryable (`Persistence`);
//! - lookups of missing records surface as `NotFound`.

use rust_decimal::Decimal;
use thiserror::Error;

use super::ids::SpvId;

/// Errors produced by the share ledger, payout engine, and schedulers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Payout or contribution amount was zero or negative.
    #[error("Invalid amount: {amount} (must be strictly positive)")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The SPV cannot fund the requested payout.
    #[error("Insufficient funds on {spv}: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The SPV whose balances were checked.
        spv: SpvId,
        /// The amount requested.
        requested: Decimal,
        /// The amount actually available under the applicable rule.
        available: Decimal,
    },

    /// Issuing the requested shares would exceed the SPV's authorised total.
    #[error(
        "Insufficient capacity on {spv}: requested {requested_shares} shares, \
         {available_shares} available"
    )]
    InsufficientCapacity {
        /// The SPV whose capacity was checked.
        spv: SpvId,
        /// Shares the purchase would have issued.
        requested_shares: Decimal,
        /// Shares still unissued.
        available_shares: Decimal,
    },

    /// Shares were issued between snapshot and execution; a fresh run is required.
    #[error(
        "Stale holdings snapshot for {spv}: snapshot at {snapshot_issued} issued shares, \
         currently {current_issued}"
    )]
    SnapshotStale {
        /// The SPV whose issuance moved.
        spv: SpvId,
        /// Issued shares when the snapshot was taken.
        snapshot_issued: Decimal,
        /// Issued shares observed at execution time.
        current_issued: Decimal,
    },

    /// The SPV is closed and accepts no further issuance or payouts.
    #[error("SPV {spv} is closed")]
    SpvClosed {
        /// The closed SPV.
        spv: SpvId,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("spv", "investment", "payout run", "sip plan").
        entity: &'static str,
        /// The identifier that missed.
        id: String,
    },

    /// Transient storage failure; the operation may be retried.
    #[error("Persistence failure: {reason}")]
    Persistence {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl LedgerError {
    /// Returns true for transient failures that a scheduler should retry on
    /// its next tick without operator intervention.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Persistence { .. })
    }

    /// Shorthand constructor for missing-record errors.
    #[inline]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_persistence_errors_are_retryable() {
        let transient = LedgerError::Persistence {
            reason: "connection reset".to_string(),
        };
        let business = LedgerError::InvalidAmount { amount: dec!(-5) };
        assert!(transient.is_retryable());
        assert!(!business.is_retryable());
    }

    #[test]
    fn display_includes_amounts() {
        let err = LedgerError::InsufficientFunds {
            spv: SpvId::new("SPV001"),
            requested: dec!(500.00),
            available: dec!(120.50),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("SPV001"));
        assert!(msg.contains("500.00"));
        assert!(msg.contains("120.50"));
    }
}
