//! Result alias used across the workspace.

use crate::error::AppError;

/// Shorthand for `Result<T, AppError>`, the return type of every
/// fallible operation in Archivio.
pub type AppResult<T> = Result<T, AppError>;
