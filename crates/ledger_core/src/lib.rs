//! # ledger_core: Domain Foundation for the SPV Ledger
//!
//! ## Layer 1 (Foundation) Role
//!
//! ledger_core serves as the bottom layer of the 5-layer architecture, providing:
//! - Fixed-point money arithmetic helpers (`types::money`)
//! - Newtype identifiers for every entity (`types::ids`)
//! - Contribution frequency arithmetic (`types::frequency`)
//! - Domain entities: `Spv`, `Investment`, `PayoutRun`, `SipPlan` (`domain`)
//! - Error taxonomy: `LedgerError` (`types::error`)
//! - Notification events and the `Notifier` seam (`events`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other ledger_* crates, with minimal external
//! dependencies:
//! - rust_decimal: fixed-point arithmetic for money and share counts
//! - chrono: date arithmetic
//! - uuid: identifier generation
//! - thiserror / serde / tracing: errors, serialisation, structured logging
//!
//! Floating point is never used for money or share fields.
//!
//! ## Usage Examples
//!
//! ```rust
//! use ledger_core::types::{ContributionFrequency, SpvId};
//! use ledger_core::types::money::floor_to_minor;
//! use rust_decimal_macros::dec;
//!
//! let spv = SpvId::new("SPV001");
//! assert_eq!(spv.as_str(), "SPV001");
//!
//! // Money is truncated to minor units (cents), never rounded up
//! assert_eq!(floor_to_minor(dec!(33.339)), dec!(33.33));
//!
//! // Frequencies advance from the previous due date, not from "now"
//! assert_eq!(ContributionFrequency::Weekly.period_days(), Some(7));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod domain;
pub mod events;
pub mod types;
