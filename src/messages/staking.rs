//! Staking module: delegate the fee token to a validator.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::proto::{Coin, TypedMessage};
use crate::messages::{string_or_number, validate_address, whole_units, ProducerResult, VALIDATOR_PREFIX};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgDelegate {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
}

impl TypedMessage for MsgDelegate {
    const TYPE_URL: &'static str = "/cosmos.staking.v1beta1.MsgDelegate";
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeTokensArgs {
    pub validator_address: String,
    /// Whole INJ, e.g. `"1.5"`.
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

/// Delegate `args.amount` whole units of `denom`, which has `decimals` places.
pub fn msg_delegate(
    delegator: &str,
    denom: &str,
    decimals: u32,
    args: &StakeTokensArgs,
) -> ProducerResult<MsgDelegate> {
    Ok(MsgDelegate {
        delegator_address: delegator.to_string(),
        validator_address: validate_address(&args.validator_address, VALIDATOR_PREFIX)?,
        amount: Some(Coin::new(whole_units(&args.amount, decimals)?, denom)),
    })
}

#[derive(Debug, Clone)]
pub struct Staking {
    pipeline: Arc<TxPipeline>,
}

impl Staking {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn stake_tokens(&self, args: StakeTokensArgs) -> ProducerResult<TxOutcome> {
        let network = self.pipeline.network();
        let msg = msg_delegate(
            self.pipeline.identity().address(),
            &network.fee_denom,
            network.fee_decimals,
            &args,
        )?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}
