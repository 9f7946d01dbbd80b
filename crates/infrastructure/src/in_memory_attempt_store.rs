use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use tidewall_application::AttemptStore;
use tidewall_domain::{AttemptOutcome, AttemptRecord, RateLimitPolicy};

/// Process-local attempt store backed by a mutex-guarded map.
///
/// The mutex serializes the whole read-modify-write of a check, so
/// concurrent callers hitting the same key never lose increments.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl InMemoryAttemptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn record_attempt(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        let mut records = self.records.lock();

        match records.get_mut(key) {
            Some(record) => record.observe(policy, now),
            None => {
                records.insert(key.to_owned(), AttemptRecord::first(now));
                AttemptOutcome::Allowed
            }
        }
    }

    fn remove(&self, key: &str) {
        self.records.lock().remove(key);
    }

    fn evict_stale(&self, cutoff: DateTime<Utc>) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| record.first_attempt() >= cutoff);

        before - records.len()
    }

    fn clear(&self) {
        self.records.lock().clear();
    }
}
