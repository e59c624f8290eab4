//! Route modules for the ledger server
//!
//! This module contains endpoint group-specific routers:
//! - payouts: payout run creation
//! - cap_table: holdings snapshot reads
//! - health: health check and monitoring endpoints

pub mod cap_table;
pub mod health;
pub mod payouts;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use ledger_core::events::LogNotifier;
use ledger_core::types::LedgerError;
use ledger_engine::{PayoutEngine, ShareLedger};
use ledger_store::MemoryStore;
use serde::Serialize;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Backing store, shared with the schedulers
    pub store: Arc<MemoryStore>,
    /// Notification sink
    pub notifier: Arc<LogNotifier>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create a new AppState over a shared store
    pub fn new(config: Arc<ServerConfig>, store: Arc<MemoryStore>) -> Self {
        Self {
            config,
            store,
            notifier: Arc::new(LogNotifier),
            start_time: std::time::Instant::now(),
        }
    }

    /// Share ledger over the shared store
    pub fn share_ledger(&self) -> ShareLedger<MemoryStore> {
        ShareLedger::new(self.store.clone())
    }

    /// Payout engine over the shared store
    pub fn payout_engine(&self) -> PayoutEngine<MemoryStore, LogNotifier> {
        PayoutEngine::new(self.store.clone(), self.notifier.clone())
    }
}

/// JSON error body returned for every failed request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Wrapper mapping engine errors onto HTTP responses
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            LedgerError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "invalid_amount"),
            LedgerError::InsufficientFunds { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
            }
            LedgerError::InsufficientCapacity { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_capacity")
            }
            LedgerError::SnapshotStale { .. } => {
                (StatusCode::CONFLICT, "snapshot_stale")
            }
            LedgerError::SpvClosed { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "spv_closed"),
            LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            LedgerError::Persistence { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "persistence_failure")
            }
        };
        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(payouts::routes())
        .merge(cap_table::routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_serves_health() {
        let state = AppState::new(
            Arc::new(ServerConfig::default()),
            Arc::new(MemoryStore::new()),
        );
        let router = build_router(state);

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let state = AppState::new(
            Arc::new(ServerConfig::default()),
            Arc::new(MemoryStore::new()),
        );
        let router = build_router(state);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
