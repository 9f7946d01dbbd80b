//! Rate limiting ports and application service.
//!
//! Implements a fixed-window rate limiter with blocking cooldown over an
//! in-process attempt store. Follows OWASP Credential Stuffing Prevention
//! cheat sheet recommendations for per-identifier throttling of sensitive
//! endpoints.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tidewall_domain::{AttemptOutcome, RateLimitCategory, RateLimitDecision, RateLimitPolicy};

mod config;
mod ports;
mod sweeper;

pub use config::{RateLimitRules, SweepConfig};
pub use ports::{AttemptStore, Clock};

/// Application service for fixed-window rate limiting with cooldown.
///
/// Constructed once by the composition root and handed to request code;
/// clones share the same store, clock, and sweeper.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    rules: RateLimitRules,
    sweep: SweepConfig,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(
        store: Arc<dyn AttemptStore>,
        clock: Arc<dyn Clock>,
        rules: RateLimitRules,
        sweep: SweepConfig,
    ) -> Self {
        Self {
            store,
            clock,
            rules,
            sweep,
            sweeper: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the active policy table.
    #[must_use]
    pub fn rules(&self) -> &RateLimitRules {
        &self.rules
    }

    /// Checks whether one more attempt under `key` fits within `policy`.
    ///
    /// Rejection is an ordinary outcome, not an error. The key should be
    /// formatted as `"{category}:{identifier}"` where identifier is
    /// typically an IP address or email.
    pub fn check(&self, key: &str, policy: &RateLimitPolicy) -> bool {
        self.record(key, policy).is_allowed()
    }

    /// Checks one more attempt for `identifier` under a named category.
    ///
    /// Composes the key as `"{category}:{identifier}"`, applies the
    /// category's policy from the rule table, and reports the wait in whole
    /// seconds when the attempt is rejected.
    pub fn check_rate_limit(
        &self,
        identifier: &str,
        category: RateLimitCategory,
    ) -> RateLimitDecision {
        let key = format!("{}:{identifier}", category.as_str());
        let policy = *self.rules.policy(category);

        RateLimitDecision::from(self.record(&key, &policy))
    }

    /// Forgets all attempt history for `key`.
    ///
    /// Called after a successful guarded action so prior failures stop
    /// counting against the key. Absent keys are a no-op.
    pub fn reset(&self, key: &str) {
        self.store.remove(key);
    }

    fn record(&self, key: &str, policy: &RateLimitPolicy) -> AttemptOutcome {
        let now = self.clock.now();
        let outcome = self.store.record_attempt(key, policy, now);

        match outcome {
            AttemptOutcome::Allowed => {}
            AttemptOutcome::LimitExceeded { .. } => {
                warn!(
                    key,
                    retry_after_secs = outcome.retry_after_secs(),
                    "rate limit threshold exceeded, key blocked"
                );
            }
            AttemptOutcome::Cooldown { .. } => {
                debug!(key, "attempt rejected during cooldown");
            }
        }

        outcome
    }
}
