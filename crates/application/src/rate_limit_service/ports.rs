use chrono::{DateTime, Utc};

use tidewall_domain::{AttemptOutcome, RateLimitPolicy};

/// Time source port.
///
/// Injecting the clock keeps window and cooldown expiry deterministic under
/// test; production wiring uses a wall-clock adapter.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Attempt-state port.
///
/// Methods are synchronous and infallible: recording an attempt is pure
/// in-memory arithmetic with no failure modes of its own. The port is the
/// seam where a shared counter store would plug in if cross-instance
/// consistency were ever needed.
pub trait AttemptStore: Send + Sync {
    /// Records one attempt for `key` against `policy` at instant `now`.
    ///
    /// The whole read-modify-write for the key is atomic: create the record
    /// on first sight, reject during an active cooldown, restart a stale
    /// window, or increment and possibly start a cooldown.
    fn record_attempt(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AttemptOutcome;

    /// Removes the record for `key`, if any.
    fn remove(&self, key: &str);

    /// Removes every record whose window started strictly before `cutoff`,
    /// regardless of block state. Returns the number of records evicted.
    fn evict_stale(&self, cutoff: DateTime<Utc>) -> usize;

    /// Removes all records.
    fn clear(&self);
}
