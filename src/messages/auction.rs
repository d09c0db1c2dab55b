//! Auction module: bid on the burn auction.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::proto::{Coin, TypedMessage};
use crate::messages::{string_or_number, whole_units, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgBid {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub bid_amount: Option<Coin>,
    #[prost(uint64, tag = "3")]
    pub round: u64,
}

impl TypedMessage for MsgBid {
    const TYPE_URL: &'static str = "/injective.auction.v1beta1.MsgBid";
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendBidArgs {
    pub round: u64,
    /// Whole INJ, e.g. `"2.5"`.
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

pub fn msg_bid(sender: &str, denom: &str, decimals: u32, args: &SendBidArgs) -> ProducerResult<MsgBid> {
    Ok(MsgBid {
        sender: sender.to_string(),
        bid_amount: Some(Coin::new(whole_units(&args.amount, decimals)?, denom)),
        round: args.round,
    })
}

#[derive(Debug, Clone)]
pub struct Auction {
    pipeline: Arc<TxPipeline>,
}

impl Auction {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn send_bid_auction(&self, args: SendBidArgs) -> ProducerResult<TxOutcome> {
        let network = self.pipeline.network();
        let msg = msg_bid(
            self.pipeline.identity().address(),
            &network.fee_denom,
            network.fee_decimals,
            &args,
        )?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_bid() {
        let args: SendBidArgs = serde_json::from_str(r#"{"round": 42, "amount": "2.5"}"#).unwrap();
        let msg = msg_bid("inj1bidder", "inj", 18, &args).unwrap();

        assert_eq!(msg.round, 42);
        assert_eq!(msg.bid_amount, Some(Coin::new("2500000000000000000", "inj")));
        assert_eq!(MsgBid::decode(msg.to_any().value.as_slice()).unwrap(), msg);
    }

    #[test]
    fn test_bid_precision_is_bounded() {
        let args: SendBidArgs =
            serde_json::from_str(r#"{"round": 1, "amount": "0.0000000000000000001"}"#).unwrap();
        assert!(msg_bid("inj1bidder", "inj", 18, &args).is_err());
    }

    #[test]
    fn test_missing_round_is_rejected() {
        assert!(serde_json::from_str::<SendBidArgs>(r#"{"amount": "1"}"#).is_err());
    }
}
