//! Account module: moves between exchange subaccounts and withdrawals over the
//! Peggy bridge.

use alloy::primitives::Address;
use prost::Message;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::blockchain::decimal::parse_base_units;
use crate::blockchain::proto::{Coin, TypedMessage};
use crate::blockchain::wallet::SigningIdentity;
use crate::messages::{string_or_number, validate_subaccount_id, ProducerError, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgSubaccountTransfer {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub source_subaccount_id: String,
    #[prost(string, tag = "3")]
    pub destination_subaccount_id: String,
    #[prost(message, optional, tag = "4")]
    pub amount: Option<Coin>,
}

impl TypedMessage for MsgSubaccountTransfer {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgSubaccountTransfer";
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgExternalTransfer {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub source_subaccount_id: String,
    #[prost(string, tag = "3")]
    pub destination_subaccount_id: String,
    #[prost(message, optional, tag = "4")]
    pub amount: Option<Coin>,
}

impl TypedMessage for MsgExternalTransfer {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgExternalTransfer";
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgSendToEth {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub eth_dest: String,
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
    #[prost(message, optional, tag = "4")]
    pub bridge_fee: Option<Coin>,
}

impl TypedMessage for MsgSendToEth {
    const TYPE_URL: &'static str = "/injective.peggy.v1.MsgSendToEth";
}

/// Transfer between two subaccounts of the signer.
#[derive(Debug, Clone, Deserialize)]
pub struct SubaccountTransferArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    pub denom: String,
    pub subaccount_idx: u32,
    pub dst_subaccount_idx: u32,
}

/// Transfer from a signer subaccount to any subaccount id.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalTransferArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    pub denom: String,
    pub subaccount_idx: u32,
    pub dst_subaccount_id: String,
}

pub fn msg_subaccount_transfer(
    identity: &SigningIdentity,
    args: &SubaccountTransferArgs,
) -> ProducerResult<MsgSubaccountTransfer> {
    Ok(MsgSubaccountTransfer {
        sender: identity.address().to_string(),
        source_subaccount_id: identity.subaccount_id(args.subaccount_idx),
        destination_subaccount_id: identity.subaccount_id(args.dst_subaccount_idx),
        amount: Some(Coin::new(parse_base_units(&args.amount)?, args.denom.clone())),
    })
}

pub fn msg_external_transfer(
    identity: &SigningIdentity,
    args: &ExternalTransferArgs,
) -> ProducerResult<MsgExternalTransfer> {
    Ok(MsgExternalTransfer {
        sender: identity.address().to_string(),
        source_subaccount_id: identity.subaccount_id(args.subaccount_idx),
        destination_subaccount_id: validate_subaccount_id(&args.dst_subaccount_id)?,
        amount: Some(Coin::new(parse_base_units(&args.amount)?, args.denom.clone())),
    })
}

/// Bridge withdrawal. `amount` and `bridge_fee` are base units of `denom`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendToEthArgs {
    pub denom: String,
    pub eth_dest: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub bridge_fee: String,
}

pub fn msg_send_to_eth(sender: &str, args: &SendToEthArgs) -> ProducerResult<MsgSendToEth> {
    let eth_dest = Address::from_str(args.eth_dest.trim())
        .map_err(|_| ProducerError::InvalidAddress(args.eth_dest.clone()))?;
    Ok(MsgSendToEth {
        sender: sender.to_string(),
        eth_dest: eth_dest.to_checksum(None),
        amount: Some(Coin::new(parse_base_units(&args.amount)?, args.denom.clone())),
        bridge_fee: Some(Coin::new(parse_base_units(&args.bridge_fee)?, args.denom.clone())),
    })
}

#[derive(Debug, Clone)]
pub struct Accounts {
    pipeline: Arc<TxPipeline>,
}

impl Accounts {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn subaccount_transfer(&self, args: SubaccountTransferArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_subaccount_transfer(self.pipeline.identity(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn external_subaccount_transfer(&self, args: ExternalTransferArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_external_transfer(self.pipeline.identity(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn send_to_eth(&self, args: SendToEthArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_send_to_eth(self.pipeline.identity().address(), &args)?;
        tracing::info!(eth_dest = %msg.eth_dest, denom = %args.denom, "Bridging to Ethereum");
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}
