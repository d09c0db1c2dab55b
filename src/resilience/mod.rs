//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatched call returns Failure{sequence_mismatch}:
//!     → retries.rs (is this failure retryable, attempts left?)
//!     → backoff.rs (jittered delay before the next attempt)
//! ```
//!
//! Node-level failover lives in the node client; nothing here re-broadcasts
//! a transaction whose outcome is unknown.

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::RetryPolicy;
