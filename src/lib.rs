//! Injective transaction relay library.
//!
//! Simulates, prices, signs and broadcasts Cosmos SDK transactions for one
//! signing identity, keeping the account sequence in step with the chain.

pub mod blockchain;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod messages;
pub mod observability;
pub mod pipeline;
pub mod resilience;

pub use config::RelayConfig;
pub use dispatch::FunctionRouter;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use pipeline::{TxOutcome, TxPipeline};
