//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / node client / dispatch produce:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log collection
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Session key, sequence and tx hash are logged as fields; key material never is
//! - Request ID flows from the HTTP layer into the trace span

pub mod logging;
pub mod metrics;
