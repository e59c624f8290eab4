//! Payout run endpoints
//!
//! Provides endpoints for creating disbursement runs, executing them, and
//! inspecting their state. Creation and execution are deliberately separate
//! steps so a run interrupted mid-execution can be resumed by re-posting to
//! the execute endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::domain::{PayoutRun, PayoutStatus, PayoutType};
use ledger_core::types::{Money, PayoutRunId, SpvId};
use ledger_store::LedgerStore;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};

/// Request body for creating a payout run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayoutRequest {
    /// SPV to distribute from
    pub spv_id: String,
    /// Disbursement kind
    pub payout_type: PayoutType,
    /// Gross amount to distribute
    pub total_amount: Money,
    /// Value date of the payout
    pub payout_date: NaiveDate,
}

/// Payout run representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRunResponse {
    /// Run identifier
    pub id: String,
    /// SPV being distributed from
    pub spv_id: String,
    /// Disbursement kind
    pub payout_type: PayoutType,
    /// Gross amount to distribute
    pub total_amount: Money,
    /// Value date of the payout
    pub payout_date: NaiveDate,
    /// Current state-machine position
    pub status: PayoutStatus,
    /// Number of holdings captured in the snapshot
    pub recipient_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Completion time, once reached
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PayoutRun> for PayoutRunResponse {
    fn from(run: PayoutRun) -> Self {
        Self {
            id: run.id.as_str().to_string(),
            spv_id: run.spv_id.as_str().to_string(),
            payout_type: run.payout_type,
            total_amount: run.total_amount,
            payout_date: run.payout_date,
            status: run.status,
            recipient_count: run.snapshot.holdings().len(),
            created_at: run.created_at,
            completed_at: run.completed_at,
        }
    }
}

/// Build the payout routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payouts", post(create_payout_handler))
        .route("/api/payouts/{id}", get(get_payout_handler))
        .route("/api/payouts/{id}/execute", post(execute_payout_handler))
}

/// POST /api/payouts - Create a pending payout run
///
/// Snapshots the SPV's cap table and validates funds, but moves no money.
/// Returns 201 with the pending run on success.
async fn create_payout_handler(
    State(state): State<AppState>,
    Json(request): Json<CreatePayoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.payout_engine();
    let run = engine.create_payout_run(
        &SpvId::new(&request.spv_id),
        request.payout_type,
        request.total_amount,
        request.payout_date,
    )?;

    tracing::info!(run = %run.id, spv = %run.spv_id, "Payout run created via API");
    Ok((StatusCode::CREATED, Json(PayoutRunResponse::from(run))))
}

/// POST /api/payouts/{id}/execute - Execute (or resume) a payout run
///
/// Idempotent: re-posting against a completed run is a no-op, and re-posting
/// against a partially-written run resumes it without duplicating line items.
async fn execute_payout_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.payout_engine();
    let run = engine.execute_payout_run(&PayoutRunId::new(&id))?;
    Ok((StatusCode::OK, Json(PayoutRunResponse::from(run))))
}

/// GET /api/payouts/{id} - Fetch a payout run
async fn get_payout_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state.store.get_payout_run(&PayoutRunId::new(&id))?;
    Ok((StatusCode::OK, Json(PayoutRunResponse::from(run))))
}
