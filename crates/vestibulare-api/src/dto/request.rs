//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters for `POST /api/admin/sweep`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SweepRequest {
    /// Override of the configured look-ahead window, in days.
    #[validate(range(min = 0, max = 366, message = "window_days must be between 0 and 366"))]
    pub window_days: Option<u32>,
}
