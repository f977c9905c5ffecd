//! Operator-only handlers.

pub mod broadcast;
pub mod sweep;

use vestibulare_core::AppError;

use crate::state::AppState;

/// New runs are refused once shutdown has begun.
fn ensure_accepting(state: &AppState) -> Result<(), AppError> {
    if state.engine.is_stopping() {
        return Err(AppError::service_unavailable("server is shutting down"));
    }
    Ok(())
}
