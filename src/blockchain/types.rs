//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The address has never transacted on this chain.
    #[error("Account {0} not found on chain")]
    AccountNotFound(String),

    /// The node refused to simulate the transaction.
    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// The node refused the signed transaction before inclusion.
    #[error("Broadcast rejected: {0}")]
    Broadcast(String),

    /// The broadcast request was sent but no response was read.
    #[error("Broadcast outcome unknown: {0}")]
    BroadcastAmbiguous(String),

    /// Invalid private key format or derivation error.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Network name outside the supported set.
    #[error("Unknown network '{0}' (expected mainnet or testnet)")]
    UnknownNetwork(String),

    /// Transaction encoding or signing failed.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl BlockchainError {
    /// Transport-level failure: safe to retry the whole call.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            BlockchainError::Rpc(_) | BlockchainError::Timeout(_) | BlockchainError::BroadcastAmbiguous(_)
        )
    }

    /// Rejection caused by a stale locally cached sequence.
    pub fn is_sequence_mismatch(&self) -> bool {
        match self {
            BlockchainError::Simulation(reason) | BlockchainError::Broadcast(reason) => {
                is_sequence_mismatch_message(reason)
            }
            _ => false,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Cosmos SDK code returned for `ErrWrongSequence`.
pub const WRONG_SEQUENCE_CODE: u32 = 32;

/// Codespace of errors raised by the SDK itself.
pub const SDK_CODESPACE: &str = "sdk";

/// Check a node error message for the sequence-drift pattern.
pub fn is_sequence_mismatch_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("incorrect account sequence") || message.contains("account sequence mismatch")
}

/// On-chain account numbers needed to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Gas estimate returned by a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    pub gas_used: u64,
}

/// Node response to a sync-mode broadcast.
///
/// `echo` carries every other field of the node's `tx_response`, so callers
/// see what the node reported without the core interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastReceipt {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub height: u64,
    pub code: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub codespace: String,
    #[serde(rename = "rawLog", skip_serializing_if = "String::is_empty")]
    pub raw_log: String,
    #[serde(flatten)]
    pub echo: Map<String, Value>,
}

impl BroadcastReceipt {
    /// True when the node accepted the transaction into its mempool.
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }

    /// Rejected because the signed sequence was stale, by code or by log text.
    pub fn is_sequence_mismatch(&self) -> bool {
        let by_code = self.code == WRONG_SEQUENCE_CODE
            && (self.codespace.is_empty() || self.codespace == SDK_CODESPACE);
        by_code || (!self.is_accepted() && is_sequence_mismatch_message(&self.raw_log))
    }

    /// Human-readable reason for a non-zero code.
    pub fn rejection_reason(&self) -> String {
        if self.raw_log.is_empty() {
            format!("transaction rejected with code {} ({})", self.code, self.codespace)
        } else {
            self.raw_log.clone()
        }
    }
}
