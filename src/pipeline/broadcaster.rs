//! Simulate, price, sign and broadcast, one call at a time per session.
//!
//! # Stages
//! ```text
//! Idle → SimulationSigning → Simulated → FinalSigning → Broadcasting
//!      → Completed | Rejected | NetworkFailed
//! ```
//!
//! The session lock is held from `ensure_session` to the end of the
//! broadcast. The guard is scoped, so abandoning the future at any await
//! point releases it.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::blockchain::client::NodeClient;
use crate::blockchain::network::NetworkProfile;
use crate::blockchain::proto::Any;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::SigningIdentity;
use crate::observability::metrics;
use crate::pipeline::fees;
use crate::pipeline::outcome::{FailureKind, TxFailure, TxOutcome};
use crate::pipeline::session::{Session, SessionKey, SessionSettings, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    SimulationSigning,
    Simulated,
    FinalSigning,
    Broadcasting,
    Completed,
    Rejected,
    NetworkFailed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SimulationSigning => "simulation_signing",
            Stage::Simulated => "simulated",
            Stage::FinalSigning => "final_signing",
            Stage::Broadcasting => "broadcasting",
            Stage::Completed => "completed",
            Stage::Rejected => "rejected",
            Stage::NetworkFailed => "network_failed",
        };
        f.write_str(name)
    }
}

fn at(stage: Stage) -> impl Fn(BlockchainError) -> (Stage, TxFailure) {
    move |e| (stage, TxFailure::from(e))
}

/// Transaction pipeline owning one signing identity's session on one network.
pub struct TxPipeline {
    identity: SigningIdentity,
    network: NetworkProfile,
    node: Arc<dyn NodeClient>,
    settings: SessionSettings,
    session: Mutex<Option<Session>>,
}

impl TxPipeline {
    pub fn new(identity: SigningIdentity, network: NetworkProfile, node: Arc<dyn NodeClient>) -> Self {
        Self {
            identity,
            network,
            node,
            settings: SessionSettings::default(),
            session: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub fn network(&self) -> &NetworkProfile {
        &self.network
    }

    pub fn node(&self) -> &Arc<dyn NodeClient> {
        &self.node
    }

    pub fn key(&self) -> SessionKey {
        SessionKey {
            address: self.identity.address().to_string(),
            chain_id: self.network.chain_id.clone(),
        }
    }

    /// Current session state, if one has been established.
    pub async fn session_snapshot(&self) -> Option<SessionSnapshot> {
        self.session.lock().await.as_ref().map(Session::snapshot)
    }

    /// Establish the session if missing or flagged stale. Idempotent.
    pub async fn ensure_session(&self) -> BlockchainResult<SessionSnapshot> {
        let mut slot = self.session.lock().await;
        self.ensure_locked(&mut slot).await
    }

    async fn ensure_locked(&self, slot: &mut Option<Session>) -> BlockchainResult<SessionSnapshot> {
        if let Some(session) = slot.as_mut().filter(|s| !s.needs_resync()) {
            if session.height_is_stale(&self.settings) {
                let height = self.node.latest_height().await?;
                session.refresh_timeout_height(height, &self.settings);
            }
            return Ok(session.snapshot());
        }

        let resync = slot.is_some();
        let account = self.node.fetch_account(self.identity.address()).await?;
        let height = self.node.latest_height().await?;
        let session = Session::new(account, height, &self.settings);

        if resync {
            metrics::record_session_resync();
        }
        tracing::info!(
            session = %self.key(),
            account_number = session.account_number(),
            sequence = session.sequence(),
            timeout_height = session.timeout_height(),
            resync,
            "Session established"
        );

        let snapshot = session.snapshot();
        *slot = Some(session);
        Ok(snapshot)
    }

    /// Build, price, sign and broadcast a single message.
    pub async fn build_and_broadcast(&self, message: Any) -> TxOutcome {
        self.build_and_broadcast_batch(vec![message]).await
    }

    /// Same as [`build_and_broadcast`](Self::build_and_broadcast) for an ordered batch.
    pub async fn build_and_broadcast_batch(&self, messages: Vec<Any>) -> TxOutcome {
        let start = Instant::now();
        let outcome = self.sequenced(messages).await;
        metrics::record_tx(outcome.label(), start);
        outcome
    }

    async fn sequenced(&self, messages: Vec<Any>) -> TxOutcome {
        if messages.is_empty() {
            return TxOutcome::failure(FailureKind::Internal, "transaction has no messages");
        }

        let mut slot = self.session.lock().await;
        if let Err(e) = self.ensure_locked(&mut slot).await {
            tracing::warn!(session = %self.key(), error = %e, "Session establishment failed");
            return e.into();
        }
        let Some(session) = slot.as_mut() else {
            return TxOutcome::failure(FailureKind::Internal, "session unavailable");
        };

        match self.run(session, messages).await {
            Ok(outcome) => outcome,
            Err((stage, failure)) => {
                tracing::warn!(
                    session = %self.key(),
                    stage = %stage,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Transaction failed"
                );
                TxOutcome::Failure(failure)
            }
        }
    }

    /// Steps 2–9. The caller holds the session lock.
    async fn run(&self, session: &mut Session, messages: Vec<Any>) -> Result<TxOutcome, (Stage, TxFailure)> {
        let key = self.key();

        tracing::debug!(session = %key, sequence = session.sequence(), stage = %Stage::SimulationSigning, "Signing for simulation");
        let provisional = PendingTransaction::new(self.network.chain_id.clone())
            .with_messages(messages)
            .with_sequence(session.sequence())
            .with_account_number(session.account_number());
        let simulation_bytes = provisional
            .sign(&self.identity)
            .map_err(at(Stage::SimulationSigning))?;

        let simulation = match self.node.simulate(&simulation_bytes).await {
            Ok(simulation) => simulation,
            Err(e) => {
                if e.is_sequence_mismatch() {
                    session.mark_stale();
                }
                let stage = if e.is_network() { Stage::NetworkFailed } else { Stage::Rejected };
                return Err((stage, e.into()));
            }
        };

        let fee = fees::quote(simulation.gas_used, &self.network);
        tracing::debug!(
            session = %key,
            stage = %Stage::Simulated,
            gas_used = simulation.gas_used,
            gas_limit = fee.gas_limit,
            fee = %fee.display,
            "Simulation complete"
        );

        tracing::debug!(session = %key, stage = %Stage::FinalSigning, "Signing priced transaction");
        let final_tx = provisional
            .with_gas(fee.gas_limit)
            .with_fee(fee.coins())
            .with_memo("")
            .with_timeout_height(session.timeout_height());
        let tx_bytes = final_tx.sign(&self.identity).map_err(at(Stage::FinalSigning))?;

        tracing::debug!(session = %key, stage = %Stage::Broadcasting, sequence = final_tx.sequence(), "Broadcasting");
        let receipt = match self.node.broadcast_sync(&tx_bytes).await {
            Ok(receipt) => receipt,
            Err(e) => {
                // An indeterminate broadcast leaves the sequence alone; a
                // later mismatch triggers the resync.
                let stage = if e.is_network() {
                    Stage::NetworkFailed
                } else {
                    session.mark_stale();
                    Stage::Rejected
                };
                return Err((stage, e.into()));
            }
        };

        if !receipt.is_accepted() {
            session.mark_stale();
            return Err((Stage::Rejected, TxFailure::from_receipt(&receipt)));
        }

        session.advance();
        tracing::info!(
            session = %key,
            stage = %Stage::Completed,
            tx_hash = %receipt.tx_hash,
            sequence = final_tx.sequence(),
            gas_wanted = fee.gas_limit,
            "Transaction broadcast"
        );

        Ok(TxOutcome::Success {
            receipt,
            gas_wanted: fee.gas_limit,
            gas_fee: fee.display,
        })
    }
}

impl fmt::Debug for TxPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxPipeline")
            .field("address", &self.identity.address())
            .field("chain_id", &self.network.chain_id)
            .finish()
    }
}
