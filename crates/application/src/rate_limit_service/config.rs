use serde::{Deserialize, Serialize};

use tidewall_core::{AppError, AppResult};
use tidewall_domain::{RateLimitCategory, RateLimitPolicy};

/// Per-category policy table.
///
/// `Default` yields the built-in table; deployments override single
/// categories with [`RateLimitRules::with_policy`] or deserialize a full
/// table from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRules {
    login: RateLimitPolicy,
    signup: RateLimitPolicy,
    password_reset: RateLimitPolicy,
    api: RateLimitPolicy,
}

impl RateLimitRules {
    /// Returns the policy for `category`.
    #[must_use]
    pub fn policy(&self, category: RateLimitCategory) -> &RateLimitPolicy {
        match category {
            RateLimitCategory::Login => &self.login,
            RateLimitCategory::Signup => &self.signup,
            RateLimitCategory::PasswordReset => &self.password_reset,
            RateLimitCategory::Api => &self.api,
        }
    }

    /// Replaces the policy for a single category.
    #[must_use]
    pub fn with_policy(mut self, category: RateLimitCategory, policy: RateLimitPolicy) -> Self {
        match category {
            RateLimitCategory::Login => self.login = policy,
            RateLimitCategory::Signup => self.signup = policy,
            RateLimitCategory::PasswordReset => self.password_reset = policy,
            RateLimitCategory::Api => self.api = policy,
        }

        self
    }
}

impl Default for RateLimitRules {
    fn default() -> Self {
        Self {
            login: RateLimitCategory::Login.default_policy(),
            signup: RateLimitCategory::Signup.default_policy(),
            password_reset: RateLimitCategory::PasswordReset.default_policy(),
            api: RateLimitCategory::Api.default_policy(),
        }
    }
}

/// Sweep cadence and retention for the background eviction task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    interval_ms: u64,
    max_age_ms: i64,
}

impl SweepConfig {
    /// Creates validated sweep settings. Both values must be positive.
    pub fn new(interval_ms: u64, max_age_ms: i64) -> AppResult<Self> {
        if interval_ms == 0 {
            return Err(AppError::Configuration(
                "sweep interval_ms must be positive".to_owned(),
            ));
        }

        if max_age_ms <= 0 {
            return Err(AppError::Configuration(
                "sweep max_age_ms must be positive".to_owned(),
            ));
        }

        Ok(Self {
            interval_ms,
            max_age_ms,
        })
    }

    /// Interval between sweep runs in milliseconds.
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Age beyond which a record is evicted, in milliseconds.
    #[must_use]
    pub fn max_age_ms(&self) -> i64 {
        self.max_age_ms
    }

    /// Age beyond which a record is evicted, as a duration.
    #[must_use]
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.max_age_ms)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5 * 60 * 1000,
            max_age_ms: 60 * 60 * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use tidewall_domain::{RateLimitCategory, RateLimitPolicy};

    use super::{RateLimitRules, SweepConfig};

    #[test]
    fn default_rules_match_built_in_policies() {
        let rules = RateLimitRules::default();

        assert_eq!(rules.policy(RateLimitCategory::Login).max_attempts(), 10);
        assert_eq!(rules.policy(RateLimitCategory::Signup).max_attempts(), 5);
        assert_eq!(
            rules.policy(RateLimitCategory::PasswordReset).max_attempts(),
            3
        );
        assert_eq!(rules.policy(RateLimitCategory::Api).max_attempts(), 100);
    }

    #[test]
    fn with_policy_overrides_one_category() {
        let tightened = RateLimitPolicy::new(2, 30_000, Some(60_000));
        assert!(tightened.is_ok());
        let tightened = tightened.unwrap_or_else(|_| unreachable!());

        let rules = RateLimitRules::default().with_policy(RateLimitCategory::Login, tightened);

        assert_eq!(rules.policy(RateLimitCategory::Login).max_attempts(), 2);
        assert_eq!(rules.policy(RateLimitCategory::Signup).max_attempts(), 5);
    }

    #[test]
    fn rules_deserialize_from_configuration() {
        let parsed: Result<RateLimitRules, _> = serde_json::from_value(serde_json::json!({
            "login": { "max_attempts": 4, "window_ms": 60_000, "block_duration_ms": 30_000 },
            "signup": { "max_attempts": 2, "window_ms": 120_000 },
            "password_reset": { "max_attempts": 1, "window_ms": 300_000 },
            "api": { "max_attempts": 50, "window_ms": 1_000 },
        }));

        assert!(parsed.is_ok());
        let rules = parsed.unwrap_or_else(|_| unreachable!());
        assert_eq!(rules.policy(RateLimitCategory::Login).max_attempts(), 4);
        assert_eq!(
            rules.policy(RateLimitCategory::Signup).block_duration(),
            chrono::Duration::minutes(15)
        );
    }

    #[test]
    fn sweep_config_rejects_non_positive_values() {
        assert!(SweepConfig::new(0, 60_000).is_err());
        assert!(SweepConfig::new(1_000, 0).is_err());
        assert!(SweepConfig::new(1_000, -5).is_err());
    }

    #[test]
    fn sweep_config_defaults_to_five_minutes_and_one_hour() {
        let config = SweepConfig::default();

        assert_eq!(config.interval_ms(), 5 * 60 * 1000);
        assert_eq!(config.max_age(), chrono::Duration::hours(1));
    }
}
