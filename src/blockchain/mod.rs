//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + NetworkProfile
//!     → wallet.rs (key loading, address, signing)
//!     → transaction.rs (body / auth info / sign doc, raw bytes)
//!     → client.rs (account, simulate, broadcast with timeouts)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All node calls have configurable timeouts

pub mod client;
pub mod decimal;
pub mod network;
pub mod proto;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{LcdNodeClient, NodeClient};
pub use network::{NetworkKind, NetworkProfile};
pub use proto::{Any, Coin, TypedMessage};
pub use transaction::PendingTransaction;
pub use types::{AccountInfo, BlockchainError, BlockchainResult, BroadcastReceipt, SimulationResult};
pub use wallet::SigningIdentity;
