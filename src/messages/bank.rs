//! Bank module: plain token transfers.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::decimal::parse_base_units;
use crate::blockchain::proto::{Coin, TypedMessage};
use crate::blockchain::wallet::ACCOUNT_PREFIX;
use crate::messages::{string_or_number, validate_address, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

impl TypedMessage for MsgSend {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgSend";
}

/// Arguments of `transfer_funds`. `amount` is in base units of `denom`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferFundsArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    pub denom: String,
    pub to_address: String,
}

pub fn msg_send(sender: &str, args: &TransferFundsArgs) -> ProducerResult<MsgSend> {
    Ok(MsgSend {
        from_address: sender.to_string(),
        to_address: validate_address(&args.to_address, ACCOUNT_PREFIX)?,
        amount: vec![Coin::new(parse_base_units(&args.amount)?, args.denom.clone())],
    })
}

#[derive(Debug, Clone)]
pub struct Bank {
    pipeline: Arc<TxPipeline>,
}

impl Bank {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn transfer_funds(&self, args: TransferFundsArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_send(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}
