//! One pipeline per signing identity and network.
//!
//! Pipelines for distinct keys never share a lock, so they make progress
//! independently while calls on the same key stay serialized.

use dashmap::DashMap;
use std::sync::Arc;

use crate::blockchain::client::NodeClient;
use crate::blockchain::network::NetworkProfile;
use crate::blockchain::wallet::SigningIdentity;
use crate::pipeline::broadcaster::TxPipeline;
use crate::pipeline::session::{SessionKey, SessionSettings};

/// Concurrent map of session key to pipeline.
#[derive(Clone)]
pub struct PipelineRegistry {
    node: Arc<dyn NodeClient>,
    network: NetworkProfile,
    settings: SessionSettings,
    pipelines: Arc<DashMap<SessionKey, Arc<TxPipeline>>>,
}

impl PipelineRegistry {
    pub fn new(node: Arc<dyn NodeClient>, network: NetworkProfile) -> Self {
        Self {
            node,
            network,
            settings: SessionSettings::default(),
            pipelines: Arc::new(DashMap::new()),
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn network(&self) -> &NetworkProfile {
        &self.network
    }

    /// Pipeline for `identity`, created on first use.
    pub fn get_or_insert(&self, identity: SigningIdentity) -> Arc<TxPipeline> {
        let key = SessionKey {
            address: identity.address().to_string(),
            chain_id: self.network.chain_id.clone(),
        };
        self.pipelines
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(address = %identity.address(), chain_id = %self.network.chain_id, "Creating pipeline");
                Arc::new(
                    TxPipeline::new(identity, self.network.clone(), self.node.clone())
                        .with_settings(self.settings),
                )
            })
            .clone()
    }

    pub fn get(&self, key: &SessionKey) -> Option<Arc<TxPipeline>> {
        self.pipelines.get(key).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
