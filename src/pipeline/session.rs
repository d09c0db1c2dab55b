//! Per-identity, per-network sequencing state.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::blockchain::types::AccountInfo;

/// Blocks added to the latest height to form a transaction's timeout height.
pub const TIMEOUT_HEIGHT_OFFSET: u64 = 30;

/// Age after which the timeout height is re-derived from the latest block.
pub const TIMEOUT_HEIGHT_REFRESH: Duration = Duration::from_secs(20);

/// Identifies one session: an address on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey {
    pub address: String,
    pub chain_id: String,
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.address, self.chain_id)
    }
}

/// Session timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub timeout_height_offset: u64,
    pub timeout_height_refresh: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_height_offset: TIMEOUT_HEIGHT_OFFSET,
            timeout_height_refresh: TIMEOUT_HEIGHT_REFRESH,
        }
    }
}

/// Mutable account state used to sequence transactions.
///
/// After the first fetch the sequence is tracked locally; the account is
/// only re-fetched once `needs_resync` has been raised.
#[derive(Debug, Clone)]
pub struct Session {
    account_number: u64,
    sequence: u64,
    timeout_height: u64,
    height_synced_at: Instant,
    needs_resync: bool,
}

impl Session {
    pub fn new(account: AccountInfo, latest_height: u64, settings: &SessionSettings) -> Self {
        Self {
            account_number: account.account_number,
            sequence: account.sequence,
            timeout_height: latest_height.saturating_add(settings.timeout_height_offset),
            height_synced_at: Instant::now(),
            needs_resync: false,
        }
    }

    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timeout_height(&self) -> u64 {
        self.timeout_height
    }

    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Consume the sequence slot after the node accepted a transaction.
    pub fn advance(&mut self) {
        self.sequence += 1;
    }

    /// Force an account re-fetch before the next transaction.
    pub fn mark_stale(&mut self) {
        self.needs_resync = true;
    }

    pub fn height_is_stale(&self, settings: &SessionSettings) -> bool {
        self.height_synced_at.elapsed() >= settings.timeout_height_refresh
    }

    pub fn refresh_timeout_height(&mut self, latest_height: u64, settings: &SessionSettings) {
        self.timeout_height = latest_height.saturating_add(settings.timeout_height_offset);
        self.height_synced_at = Instant::now();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            account_number: self.account_number,
            sequence: self.sequence,
            timeout_height: self.timeout_height,
            needs_resync: self.needs_resync,
        }
    }
}

/// Read-only copy of a session for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub account_number: u64,
    pub sequence: u64,
    pub timeout_height: u64,
    pub needs_resync: bool,
}
