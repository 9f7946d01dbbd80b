use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::RateLimitPolicy;

/// Per-key mutable attempt state for one fixed window.
///
/// Records are owned by the limiter's store; callers only ever see the
/// outcomes derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    count: u32,
    first_attempt: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    /// Creates the record for a key's first observed attempt.
    #[must_use]
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            blocked_until: None,
        }
    }

    /// Attempts observed in the current window, including the first.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Start of the current window.
    #[must_use]
    pub fn first_attempt(&self) -> DateTime<Utc> {
        self.first_attempt
    }

    /// Cooldown deadline, if one is set.
    #[must_use]
    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        self.blocked_until
    }

    /// Records one attempt against `policy` at instant `now`.
    ///
    /// Transitions, evaluated in order: an active cooldown rejects the
    /// attempt without counting it; a stale window (strictly older than the
    /// window length) restarts the record; otherwise the count increments,
    /// and the attempt that crosses the threshold starts a cooldown.
    pub fn observe(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> AttemptOutcome {
        if let Some(blocked_until) = self.blocked_until
            && now < blocked_until
        {
            return AttemptOutcome::Cooldown {
                retry_after: self.retry_after(policy, now),
            };
        }

        if now - self.first_attempt > policy.window() {
            *self = Self::first(now);
            return AttemptOutcome::Allowed;
        }

        self.count += 1;
        if self.count > policy.max_attempts() {
            self.blocked_until = Some(now + policy.block_duration());
            return AttemptOutcome::LimitExceeded {
                retry_after: self.retry_after(policy, now),
            };
        }

        AttemptOutcome::Allowed
    }

    /// Wait until the key is worth retrying: the remaining cooldown while a
    /// block is active, otherwise the remainder of the current window.
    fn retry_after(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> Duration {
        match self.blocked_until {
            Some(blocked_until) if now < blocked_until => blocked_until - now,
            _ => (self.first_attempt + policy.window()) - now,
        }
    }
}

/// Outcome of recording a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt was admitted within the window.
    Allowed,
    /// This attempt crossed the policy threshold; the key enters cooldown.
    LimitExceeded {
        /// Time remaining until attempts may succeed again.
        retry_after: Duration,
    },
    /// The key was already in cooldown; the attempt was rejected uncounted.
    Cooldown {
        /// Time remaining until attempts may succeed again.
        retry_after: Duration,
    },
}

impl AttemptOutcome {
    /// Whether the attempt was admitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Remaining wait in whole seconds, rounded up. `None` when allowed.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Allowed => None,
            Self::LimitExceeded { retry_after } | Self::Cooldown { retry_after } => {
                let millis = u64::try_from(retry_after.num_milliseconds().max(0)).unwrap_or(0);
                Some(millis.div_ceil(1000))
            }
        }
    }
}

/// Caller-facing decision for a named category check.
///
/// Serializable so request handlers can embed it directly in 429-style
/// response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the attempt may proceed.
    pub allowed: bool,
    /// Whole seconds to wait before retrying, when not allowed.
    pub retry_after: Option<u64>,
}

impl From<AttemptOutcome> for RateLimitDecision {
    fn from(outcome: AttemptOutcome) -> Self {
        Self {
            allowed: outcome.is_allowed(),
            retry_after: outcome.retry_after_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    use super::{AttemptOutcome, AttemptRecord, RateLimitDecision};
    use crate::RateLimitPolicy;

    fn policy(max_attempts: u32, window_ms: i64, block_duration_ms: Option<i64>) -> RateLimitPolicy {
        RateLimitPolicy::new(max_attempts, window_ms, block_duration_ms)
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn first_attempt_opens_window_with_count_one() {
        let now = Utc::now();
        let record = AttemptRecord::first(now);

        assert_eq!(record.count(), 1);
        assert_eq!(record.first_attempt(), now);
        assert!(record.blocked_until().is_none());
    }

    #[test]
    fn attempts_within_window_increment_count() {
        let policy = policy(3, 60_000, Some(120_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        let outcome = record.observe(&policy, now + Duration::seconds(1));
        assert_eq!(outcome, AttemptOutcome::Allowed);
        assert_eq!(record.count(), 2);
        assert_eq!(record.first_attempt(), now);
    }

    #[test]
    fn attempt_crossing_threshold_starts_cooldown() {
        let policy = policy(3, 60_000, Some(120_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        assert!(record.observe(&policy, now).is_allowed());
        assert!(record.observe(&policy, now).is_allowed());

        let outcome = record.observe(&policy, now);
        assert_eq!(
            outcome,
            AttemptOutcome::LimitExceeded {
                retry_after: Duration::milliseconds(120_000),
            }
        );
        assert_eq!(record.count(), 4);
        assert_eq!(record.blocked_until(), Some(now + Duration::seconds(120)));
    }

    #[test]
    fn cooldown_rejects_without_counting() {
        let policy = policy(1, 60_000, Some(120_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        assert!(!record.observe(&policy, now).is_allowed());
        let count_when_blocked = record.count();

        for elapsed in 1..5 {
            let outcome = record.observe(&policy, now + Duration::seconds(elapsed));
            assert!(matches!(outcome, AttemptOutcome::Cooldown { .. }));
        }

        assert_eq!(record.count(), count_when_blocked);
    }

    #[test]
    fn stale_window_restarts_count() {
        let policy = policy(3, 60_000, None);
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        assert!(record.observe(&policy, now).is_allowed());
        assert_eq!(record.count(), 2);

        let later = now + Duration::milliseconds(60_001);
        assert!(record.observe(&policy, later).is_allowed());
        assert_eq!(record.count(), 1);
        assert_eq!(record.first_attempt(), later);
    }

    #[test]
    fn window_is_still_active_at_exact_expiry_instant() {
        let policy = policy(2, 60_000, Some(120_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        let at_boundary = now + Duration::milliseconds(60_000);
        assert!(record.observe(&policy, at_boundary).is_allowed());
        assert_eq!(record.count(), 2);

        let outcome = record.observe(&policy, at_boundary);
        assert!(matches!(outcome, AttemptOutcome::LimitExceeded { .. }));
    }

    #[test]
    fn expired_cooldown_with_stale_window_restarts_record() {
        let policy = policy(1, 60_000, Some(120_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        assert!(!record.observe(&policy, now).is_allowed());

        let after_block = now + Duration::milliseconds(120_001);
        assert!(record.observe(&policy, after_block).is_allowed());
        assert_eq!(record.count(), 1);
        assert!(record.blocked_until().is_none());
    }

    #[test]
    fn expired_cooldown_within_active_window_blocks_again() {
        let policy = policy(3, 600_000, Some(5_000));
        let now = Utc::now();
        let mut record = AttemptRecord::first(now);

        assert!(record.observe(&policy, now).is_allowed());
        assert!(record.observe(&policy, now).is_allowed());
        assert!(!record.observe(&policy, now).is_allowed());

        let after_block = now + Duration::seconds(6);
        let outcome = record.observe(&policy, after_block);
        assert!(matches!(outcome, AttemptOutcome::LimitExceeded { .. }));
        assert_eq!(record.count(), 5);
        assert_eq!(
            record.blocked_until(),
            Some(after_block + Duration::seconds(5))
        );
    }

    #[test]
    fn retry_after_rounds_up_to_whole_seconds() {
        let outcome = AttemptOutcome::Cooldown {
            retry_after: Duration::milliseconds(1_500),
        };
        assert_eq!(outcome.retry_after_secs(), Some(2));

        let outcome = AttemptOutcome::LimitExceeded {
            retry_after: Duration::milliseconds(1_000),
        };
        assert_eq!(outcome.retry_after_secs(), Some(1));

        assert_eq!(AttemptOutcome::Allowed.retry_after_secs(), None);
    }

    #[test]
    fn decision_carries_allowed_flag_and_retry_hint() {
        let allowed = RateLimitDecision::from(AttemptOutcome::Allowed);
        assert!(allowed.allowed);
        assert!(allowed.retry_after.is_none());

        let limited = RateLimitDecision::from(AttemptOutcome::LimitExceeded {
            retry_after: Duration::seconds(900),
        });
        assert!(!limited.allowed);
        assert_eq!(limited.retry_after, Some(900));
    }

    proptest! {
        #[test]
        fn window_admits_exactly_max_attempts(max_attempts in 1u32..50, extra in 1u32..20) {
            let policy = RateLimitPolicy::new(max_attempts, 60_000, None);
            prop_assert!(policy.is_ok());
            let policy = policy.unwrap_or_else(|_| unreachable!());

            let now = Utc::now();
            let mut record = AttemptRecord::first(now);
            let mut admitted = 1_u32;

            for _ in 1..max_attempts {
                if record.observe(&policy, now).is_allowed() {
                    admitted += 1;
                }
            }
            prop_assert_eq!(admitted, max_attempts);

            for _ in 0..extra {
                prop_assert!(!record.observe(&policy, now).is_allowed());
            }
            prop_assert_eq!(record.count(), max_attempts + 1);
        }
    }
}
