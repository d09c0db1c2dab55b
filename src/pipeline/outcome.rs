//! Normalized result of a pipeline call and its JSON envelope.
//!
//! ```text
//! {"success": true,  "result": {"txHash", "height", ...}, "gasWanted": n, "gasFee": "..."}
//! {"success": false, "error": {"kind", "message"}}
//! ```

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blockchain::types::{is_sequence_mismatch_message, BlockchainError, BroadcastReceipt};

/// Failure categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport failure or indeterminate broadcast.
    Network,
    /// The chain refused the transaction.
    Rejected,
    /// Locally cached sequence was stale; the session has been flagged for resync.
    SequenceMismatch,
    /// Unknown function or module.
    NotImplemented,
    /// Bad arguments or a producer-side fault.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Rejected => "rejected",
            FailureKind::SequenceMismatch => "sequence_mismatch",
            FailureKind::NotImplemented => "not_implemented",
            FailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TxFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Chain-side rejection, classified as sequence drift when the reason says so.
    fn rejected(reason: &str) -> Self {
        let kind = if is_sequence_mismatch_message(reason) {
            FailureKind::SequenceMismatch
        } else {
            FailureKind::Rejected
        };
        Self::new(kind, reason)
    }

    /// Failure for a receipt whose code is non-zero.
    pub fn from_receipt(receipt: &BroadcastReceipt) -> Self {
        let kind = if receipt.is_sequence_mismatch() {
            FailureKind::SequenceMismatch
        } else {
            FailureKind::Rejected
        };
        Self::new(kind, receipt.rejection_reason())
    }
}

impl From<BlockchainError> for TxFailure {
    fn from(err: BlockchainError) -> Self {
        match &err {
            BlockchainError::Simulation(reason) | BlockchainError::Broadcast(reason) => {
                TxFailure::rejected(reason)
            }
            BlockchainError::AccountNotFound(_) => TxFailure::new(FailureKind::Rejected, err.to_string()),
            e if e.is_network() => TxFailure::new(FailureKind::Network, err.to_string()),
            _ => TxFailure::new(FailureKind::Internal, err.to_string()),
        }
    }
}

/// Outcome of one `build_and_broadcast` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    Success {
        receipt: BroadcastReceipt,
        gas_wanted: u64,
        gas_fee: String,
    },
    Failure(TxFailure),
}

impl TxOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        TxOutcome::Failure(TxFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TxOutcome::Success { .. })
    }

    /// Failure kind, or `None` on success.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            TxOutcome::Success { .. } => None,
            TxOutcome::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn receipt(&self) -> Option<&BroadcastReceipt> {
        match self {
            TxOutcome::Success { receipt, .. } => Some(receipt),
            TxOutcome::Failure(_) => None,
        }
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            TxOutcome::Success { .. } => "success",
            TxOutcome::Failure(failure) => failure.kind.as_str(),
        }
    }
}

impl From<BlockchainError> for TxOutcome {
    fn from(err: BlockchainError) -> Self {
        TxOutcome::Failure(err.into())
    }
}

impl Serialize for TxOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TxOutcome::Success {
                receipt,
                gas_wanted,
                gas_fee,
            } => {
                let mut state = serializer.serialize_struct("TxOutcome", 4)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("result", receipt)?;
                state.serialize_field("gasWanted", gas_wanted)?;
                state.serialize_field("gasFee", gas_fee)?;
                state.end()
            }
            TxOutcome::Failure(failure) => {
                let mut state = serializer.serialize_struct("TxOutcome", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", failure)?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn receipt() -> BroadcastReceipt {
        BroadcastReceipt {
            tx_hash: "AB12".into(),
            height: 0,
            code: 0,
            codespace: String::new(),
            raw_log: String::new(),
            echo: Map::new(),
        }
    }

    #[test]
    fn test_success_envelope() {
        let outcome = TxOutcome::Success {
            receipt: receipt(),
            gas_wanted: 114_000,
            gas_fee: "0.000057 INJ".into(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": true,
                "result": { "txHash": "AB12", "height": 0, "code": 0 },
                "gasWanted": 114000,
                "gasFee": "0.000057 INJ"
            })
        );
    }

    #[test]
    fn test_failure_envelope() {
        let outcome = TxOutcome::failure(FailureKind::Rejected, "insufficient funds");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": false,
                "error": { "kind": "rejected", "message": "insufficient funds" }
            })
        );
    }

    #[test]
    fn test_error_mapping() {
        let outcome = TxOutcome::from(BlockchainError::Simulation("insufficient funds".into()));
        assert_eq!(outcome, TxOutcome::failure(FailureKind::Rejected, "insufficient funds"));

        let outcome = TxOutcome::from(BlockchainError::Broadcast(
            "account sequence mismatch, expected 2, got 1: incorrect account sequence".into(),
        ));
        assert_eq!(outcome.kind(), Some(FailureKind::SequenceMismatch));

        assert_eq!(TxOutcome::from(BlockchainError::Timeout(5)).kind(), Some(FailureKind::Network));
        assert_eq!(
            TxOutcome::from(BlockchainError::BroadcastAmbiguous("lost".into())).kind(),
            Some(FailureKind::Network)
        );
        assert_eq!(
            TxOutcome::from(BlockchainError::Encoding("bad".into())).kind(),
            Some(FailureKind::Internal)
        );
    }

    #[test]
    fn test_rejected_receipt() {
        let mut rejected = receipt();
        rejected.code = 5;
        rejected.codespace = "sdk".into();
        rejected.raw_log = "insufficient funds".into();
        let failure = TxFailure::from_receipt(&rejected);
        assert_eq!(failure, TxFailure::new(FailureKind::Rejected, "insufficient funds"));
        assert_eq!(TxOutcome::Failure(failure).label(), "rejected");
    }

    #[test]
    fn test_wrong_sequence_code_without_log() {
        let mut rejected = receipt();
        rejected.code = 32;
        rejected.codespace = "sdk".into();
        let failure = TxFailure::from_receipt(&rejected);
        assert_eq!(failure.kind, FailureKind::SequenceMismatch);
        assert_eq!(failure.message, "transaction rejected with code 32 (sdk)");
    }
}
