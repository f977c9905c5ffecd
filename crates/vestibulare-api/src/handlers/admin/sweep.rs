//! Sweep trigger.

use axum::Json;
use axum::extract::{Query, State};
use validator::Validate;

use vestibulare_alert::DispatchReport;
use vestibulare_core::AppError;

use crate::dto::request::SweepRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/admin/sweep
///
/// Runs the date-offset sweep now. Safe to call repeatedly: candidates
/// already sent are filtered by the ledger.
pub async fn run_sweep(
    State(state): State<AppState>,
    Query(req): Query<SweepRequest>,
) -> Result<Json<ApiResponse<DispatchReport>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    super::ensure_accepting(&state)?;

    tracing::info!(window_days = ?req.window_days, "Operator triggered sweep");
    let report = state.engine.run_sweep(req.window_days).await?;
    Ok(Json(ApiResponse::ok(report)))
}
