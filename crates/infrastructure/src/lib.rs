//! Concrete adapters for the application crate's ports.

#![forbid(unsafe_code)]

mod in_memory_attempt_store;
mod manual_clock;
mod system_clock;

pub use in_memory_attempt_store::InMemoryAttemptStore;
pub use manual_clock::ManualClock;
pub use system_clock::SystemClock;
