use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tidewall_core::{AppError, AppResult};

/// Cooldown applied when a policy does not specify its own block duration.
pub const DEFAULT_BLOCK_DURATION_MS: i64 = 15 * 60 * 1000;

/// Immutable rate-limiting policy for one protected operation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    max_attempts: u32,
    window_ms: i64,
    block_duration_ms: Option<i64>,
}

impl RateLimitPolicy {
    /// Creates a validated policy.
    ///
    /// `max_attempts` and `window_ms` must be strictly positive;
    /// `block_duration_ms`, when given, must be strictly positive as well.
    pub fn new(
        max_attempts: u32,
        window_ms: i64,
        block_duration_ms: Option<i64>,
    ) -> AppResult<Self> {
        if max_attempts == 0 {
            return Err(AppError::Configuration(
                "max_attempts must be at least 1".to_owned(),
            ));
        }

        if window_ms <= 0 {
            return Err(AppError::Configuration(
                "window_ms must be positive".to_owned(),
            ));
        }

        if let Some(block_duration_ms) = block_duration_ms
            && block_duration_ms <= 0
        {
            return Err(AppError::Configuration(
                "block_duration_ms must be positive when set".to_owned(),
            ));
        }

        Ok(Self {
            max_attempts,
            window_ms,
            block_duration_ms,
        })
    }

    /// Maximum number of attempts allowed within one window.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Window length in milliseconds.
    #[must_use]
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Window length as a duration.
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window_ms)
    }

    /// Cooldown applied once the threshold is exceeded.
    ///
    /// Falls back to [`DEFAULT_BLOCK_DURATION_MS`] when the policy does not
    /// carry its own block duration.
    #[must_use]
    pub fn block_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.block_duration_ms.unwrap_or(DEFAULT_BLOCK_DURATION_MS))
    }
}

/// Protected operation categories, each with a built-in policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitCategory {
    /// Sign-in attempts, keyed by client address or account.
    Login,
    /// Account creation requests.
    Signup,
    /// Password reset requests.
    PasswordReset,
    /// Generic API traffic.
    Api,
}

impl RateLimitCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::PasswordReset => "password_reset",
            Self::Api => "api",
        }
    }

    /// Returns all known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RateLimitCategory] = &[
            RateLimitCategory::Login,
            RateLimitCategory::Signup,
            RateLimitCategory::PasswordReset,
            RateLimitCategory::Api,
        ];

        ALL
    }

    /// Returns the built-in policy for this category.
    #[must_use]
    pub fn default_policy(&self) -> RateLimitPolicy {
        match self {
            Self::Login => RateLimitPolicy {
                max_attempts: 10,
                window_ms: 15 * 60 * 1000,
                block_duration_ms: Some(15 * 60 * 1000),
            },
            Self::Signup => RateLimitPolicy {
                max_attempts: 5,
                window_ms: 60 * 60 * 1000,
                block_duration_ms: Some(60 * 60 * 1000),
            },
            Self::PasswordReset => RateLimitPolicy {
                max_attempts: 3,
                window_ms: 60 * 60 * 1000,
                block_duration_ms: Some(60 * 60 * 1000),
            },
            Self::Api => RateLimitPolicy {
                max_attempts: 100,
                window_ms: 60 * 1000,
                block_duration_ms: Some(5 * 60 * 1000),
            },
        }
    }
}

impl FromStr for RateLimitCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "login" => Ok(Self::Login),
            "signup" => Ok(Self::Signup),
            "password_reset" => Ok(Self::PasswordReset),
            "api" => Ok(Self::Api),
            _ => Err(AppError::Validation(format!(
                "unknown rate limit category '{value}'"
            ))),
        }
    }
}
