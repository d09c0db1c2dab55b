//! Transaction pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Any message(s)
//!     → registry.rs (pipeline for identity + network)
//!     → broadcaster.rs (lock session, simulate, price, sign, broadcast)
//!         → session.rs (account number, sequence, timeout height)
//!         → fees.rs (gas limit, fee amount, display string)
//!     → outcome.rs (success receipt or classified failure)
//! ```
//!
//! # Invariants
//! - At most one transaction per session is in flight between reading the
//!   sequence and receiving the broadcast response
//! - The sequence advances only when the node accepts a transaction
//! - A sequence mismatch flags the session for an account re-fetch

pub mod broadcaster;
pub mod fees;
pub mod outcome;
pub mod registry;
pub mod session;

pub use broadcaster::TxPipeline;
pub use fees::FeeQuote;
pub use outcome::{FailureKind, TxFailure, TxOutcome};
pub use registry::PipelineRegistry;
pub use session::{Session, SessionKey, SessionSettings, SessionSnapshot};
