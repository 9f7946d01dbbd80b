use std::time::Duration;

use tracing::info;

use super::*;

/// Drops records whose window opened before the retention cutoff.
///
/// Blocked records age out like any other. A stale block only matters if
/// the same key comes back, and a returning key gets a fresh window anyway.
fn run_sweep(store: &dyn AttemptStore, clock: &dyn Clock, sweep: SweepConfig) -> usize {
    let cutoff = clock.now() - sweep.max_age();
    let evicted = store.evict_stale(cutoff);

    if evicted > 0 {
        debug!(evicted, "evicted stale rate limit records");
    }

    evicted
}

impl RateLimitService {
    /// Runs one eviction pass immediately and returns the evicted count.
    pub fn sweep(&self) -> usize {
        run_sweep(self.store.as_ref(), self.clock.as_ref(), self.sweep)
    }

    /// Spawns the periodic eviction task if it is not already running.
    ///
    /// Must be called from within a Tokio runtime. Calling it again while
    /// the task is alive is a no-op.
    pub fn start_sweeper(&self) {
        let mut sweeper = self.sweeper.lock();

        if sweeper.is_some() {
            debug!("rate limit sweeper already running");
            return;
        }

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let sweep = self.sweep;

        *sweeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(sweep.interval_ms()));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                run_sweep(store.as_ref(), clock.as_ref(), sweep);
            }
        }));

        info!(
            interval_ms = sweep.interval_ms(),
            max_age_ms = sweep.max_age_ms(),
            "rate limit sweeper started"
        );
    }

    /// Stops the sweeper task and clears every tracked record.
    ///
    /// The service stays usable afterwards; [`RateLimitService::start_sweeper`]
    /// may be called again to resume periodic eviction.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }

        self.store.clear();
        info!("rate limiter shut down, records cleared");
    }
}
