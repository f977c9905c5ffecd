//! Convenience result type alias for VestibulaRe.

use crate::error::AppError;

/// A specialized `Result` type for VestibulaRe operations.
pub type AppResult<T> = Result<T, AppError>;
