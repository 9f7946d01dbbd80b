//! Application service and ports for attempt throttling.

#![forbid(unsafe_code)]

mod rate_limit_service;

pub use rate_limit_service::{AttemptStore, Clock, RateLimitRules, RateLimitService, SweepConfig};
