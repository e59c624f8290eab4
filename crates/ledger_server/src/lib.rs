//! # ledger_server: REST Surface and Scheduler Host
//!
//! Thin HTTP adapters over the ledger engines, plus the process wiring that
//! runs the SIP and payout schedulers alongside the server:
//!
//! - `POST /api/payouts` creates a payout run
//! - `GET /api/spvs/{id}/cap-table` reads the current holdings snapshot
//! - `/health`, `/ready` for monitoring
//!
//! Handlers carry no independent logic: request structs are validated at the
//! edge and handed to the engines as typed commands; engine errors map onto
//! HTTP status codes with a JSON body.

pub mod config;
pub mod routes;
pub mod server;

/// Server version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
