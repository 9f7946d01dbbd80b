//! Shared primitives for all Rust crates in Tidewall.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Tidewall crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Rate-limiting decisions are never errors: a rejected attempt is an
/// ordinary outcome value. These variants exist for constructor-time
/// validation of caller-supplied values and settings.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input value, such as an unknown category name.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid policy or sweep settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}
