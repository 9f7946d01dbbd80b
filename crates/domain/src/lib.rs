//! Domain types and invariants for fixed-window rate limiting.

#![forbid(unsafe_code)]

mod attempt;
mod policy;

pub use attempt::{AttemptOutcome, AttemptRecord, RateLimitDecision};
pub use policy::{DEFAULT_BLOCK_DURATION_MS, RateLimitCategory, RateLimitPolicy};
