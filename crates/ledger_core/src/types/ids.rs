//! Newtype identifiers for ledger entities.
//!
//! Every entity gets its own identifier type so an `InvestorId` can never be
//! passed where a `SpvId` is expected. Identifiers are plain strings; the
//! `generate` constructor produces a random UUID-backed value for new records.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing string value.
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh random identifier.
            #[inline]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

define_id! {
    /// Identifier of a Special Purpose Vehicle.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledger_core::types::SpvId;
    ///
    /// let id = SpvId::new("SPV001");
    /// assert_eq!(id.as_str(), "SPV001");
    /// ```
    SpvId
}

define_id! {
    /// Identifier of the deal an SPV is linked to.
    DealId
}

define_id! {
    /// Identifier of an investor account.
    InvestorId
}

define_id! {
    /// Identifier of a single investment (one investor's position in one SPV).
    InvestmentId
}

define_id! {
    /// Identifier of a payout run.
    PayoutRunId
}

define_id! {
    /// Identifier of a systematic investment plan.
    PlanId
}
