//! Cap table read endpoint
//!
//! Exposes the live holdings breakdown of an SPV as a fair-value read model.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use ledger_core::types::SpvId;

use super::{ApiError, AppState};

/// Build the cap table routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/spvs/{id}/cap-table", get(cap_table_handler))
}

/// GET /api/spvs/{id}/cap-table - Current holdings breakdown of an SPV
///
/// Entries are ordered by investment id and carry each holding's fraction
/// of issued shares. Exited investments are excluded.
async fn cap_table_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let table = state.share_ledger().cap_table(&SpvId::new(&id))?;
    Ok((StatusCode::OK, Json(table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use ledger_core::domain::Spv;
    use ledger_core::types::{DealId, InvestorId};
    use ledger_engine::ShareLedger;
    use ledger_store::{LedgerStore, MemoryStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn seeded_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let spv = Spv::new(
            SpvId::new("SPV-CT"),
            DealId::new("DEAL-CT"),
            dec!(1_000),
            dec!(100),
        );
        store.insert_spv(spv).unwrap();

        let ledger = ShareLedger::new(store.clone());
        ledger
            .issue_shares(
                &SpvId::new("SPV-CT"),
                &InvestorId::new("INV-A"),
                &DealId::new("DEAL-CT"),
                dec!(75_000),
            )
            .unwrap();
        ledger
            .issue_shares(
                &SpvId::new("SPV-CT"),
                &InvestorId::new("INV-B"),
                &DealId::new("DEAL-CT"),
                dec!(25_000),
            )
            .unwrap();

        AppState::new(Arc::new(ServerConfig::default()), store)
    }

    #[tokio::test]
    async fn test_cap_table_returns_entries_with_fractions() {
        let router = routes().with_state(seeded_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/spvs/SPV-CT/cap-table")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["spvId"], "SPV-CT");
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        for entry in entries {
            let expected = if entry["investorId"] == "INV-A" { "0.75" } else { "0.25" };
            assert_eq!(entry["ownershipFraction"], expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_spv_returns_404() {
        let router = routes().with_state(seeded_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/spvs/SPV-NOPE/cap-table")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
