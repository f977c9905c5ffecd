//! Operator bearer-token middleware.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::warn;

use vestibulare_core::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects requests that do not carry `Authorization: Bearer <operator.token>`.
///
/// With no token configured every operator request is refused with 403.
pub async fn require_operator(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.operator.is_enabled() {
        return Err(AppError::authorization("operator endpoints are disabled").into());
    }

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if bool::from(token.as_bytes().ct_eq(state.operator.token.as_bytes())) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected operator request with a wrong token");
            Err(AppError::authentication("invalid operator token").into())
        }
        None => Err(AppError::authentication("missing operator token").into()),
    }
}
