//! Manual broadcast trigger.

use axum::Json;
use axum::extract::{Path, State};

use vestibulare_alert::DispatchReport;
use vestibulare_core::types::ExamEventId;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/admin/events/{id}/broadcast
pub async fn broadcast_event(
    State(state): State<AppState>,
    Path(event_id): Path<ExamEventId>,
) -> Result<Json<ApiResponse<DispatchReport>>, ApiError> {
    super::ensure_accepting(&state)?;
    tracing::info!(event_id = %event_id, "Operator triggered broadcast");
    let report = state.engine.broadcast(event_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}
