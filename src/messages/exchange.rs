//! Exchange administration: instant market launches and the rewards opt-out.
//!
//! Tick sizes, notionals, fee rates and margin ratios are chain-unit
//! decimals and go on the wire in `LegacyDec` form.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::decimal::Dec;
use crate::blockchain::proto::TypedMessage;
use crate::messages::{positive, string_or_number, ProducerError, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgInstantSpotMarketLaunch {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub ticker: String,
    #[prost(string, tag = "3")]
    pub base_denom: String,
    #[prost(string, tag = "4")]
    pub quote_denom: String,
    #[prost(string, tag = "5")]
    pub min_price_tick_size: String,
    #[prost(string, tag = "6")]
    pub min_quantity_tick_size: String,
    #[prost(string, tag = "7")]
    pub min_notional: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgInstantPerpetualMarketLaunch {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub ticker: String,
    #[prost(string, tag = "3")]
    pub quote_denom: String,
    #[prost(string, tag = "4")]
    pub oracle_base: String,
    #[prost(string, tag = "5")]
    pub oracle_quote: String,
    #[prost(uint32, tag = "6")]
    pub oracle_scale_factor: u32,
    #[prost(int32, tag = "7")]
    pub oracle_type: i32,
    #[prost(string, tag = "8")]
    pub maker_fee_rate: String,
    #[prost(string, tag = "9")]
    pub taker_fee_rate: String,
    #[prost(string, tag = "10")]
    pub initial_margin_ratio: String,
    #[prost(string, tag = "11")]
    pub maintenance_margin_ratio: String,
    #[prost(string, tag = "12")]
    pub min_price_tick_size: String,
    #[prost(string, tag = "13")]
    pub min_quantity_tick_size: String,
    #[prost(string, tag = "14")]
    pub min_notional: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgRewardsOptOut {
    #[prost(string, tag = "1")]
    pub sender: String,
}

impl TypedMessage for MsgInstantSpotMarketLaunch {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgInstantSpotMarketLaunch";
}

impl TypedMessage for MsgInstantPerpetualMarketLaunch {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgInstantPerpetualMarketLaunch";
}

impl TypedMessage for MsgRewardsOptOut {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgRewardsOptOut";
}

/// `injective.oracle.v1beta1.OracleType`, by its chain name.
pub fn oracle_type(name: &str) -> ProducerResult<i32> {
    let code = match name.to_ascii_lowercase().as_str() {
        "band" => 1,
        "pricefeed" | "price_feed" => 2,
        "coinbase" => 3,
        "chainlink" => 4,
        "razor" => 5,
        "dia" => 6,
        "api3" => 7,
        "uma" => 8,
        "pyth" => 9,
        "bandibc" | "band_ibc" => 10,
        "provider" => 11,
        "stork" => 12,
        _ => return Err(ProducerError::Unsupported(format!("unknown oracle type '{}'", name))),
    };
    Ok(code)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotMarketLaunchArgs {
    pub ticker: String,
    pub base: String,
    pub quote: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_price_tick: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_quantity_tick: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_notional: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerpMarketLaunchArgs {
    pub ticker: String,
    pub quote_denom: String,
    pub oracle_base: String,
    pub oracle_quote: String,
    pub oracle_scale_factor: u32,
    pub oracle_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub maker_fee_rate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub taker_fee_rate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub initial_margin_ratio: String,
    #[serde(deserialize_with = "string_or_number")]
    pub maintenance_margin_ratio: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_price_tick: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_quantity_tick: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_notional_size: String,
}

fn required(value: &str, field: &str) -> ProducerResult<String> {
    if value.trim().is_empty() {
        return Err(ProducerError::Unsupported(format!("{} is required", field)));
    }
    Ok(value.trim().to_string())
}

fn dec(value: &str) -> ProducerResult<Dec> {
    Ok(value.parse()?)
}

pub fn msg_instant_spot_market_launch(
    sender: &str,
    args: &SpotMarketLaunchArgs,
) -> ProducerResult<MsgInstantSpotMarketLaunch> {
    let base_denom = required(&args.base, "base")?;
    let quote_denom = required(&args.quote, "quote")?;
    if base_denom == quote_denom {
        return Err(ProducerError::Unsupported("base and quote denoms must differ".to_string()));
    }

    Ok(MsgInstantSpotMarketLaunch {
        sender: sender.to_string(),
        ticker: required(&args.ticker, "ticker")?,
        base_denom,
        quote_denom,
        min_price_tick_size: positive(&args.min_price_tick, "min_price_tick")?.to_chain_string(),
        min_quantity_tick_size: positive(&args.min_quantity_tick, "min_quantity_tick")?.to_chain_string(),
        min_notional: dec(&args.min_notional)?.to_chain_string(),
    })
}

pub fn msg_instant_perpetual_market_launch(
    sender: &str,
    args: &PerpMarketLaunchArgs,
) -> ProducerResult<MsgInstantPerpetualMarketLaunch> {
    let initial = positive(&args.initial_margin_ratio, "initial_margin_ratio")?;
    let maintenance = positive(&args.maintenance_margin_ratio, "maintenance_margin_ratio")?;
    if maintenance >= initial {
        return Err(ProducerError::Unsupported(
            "maintenance_margin_ratio must be below initial_margin_ratio".to_string(),
        ));
    }

    Ok(MsgInstantPerpetualMarketLaunch {
        sender: sender.to_string(),
        ticker: required(&args.ticker, "ticker")?,
        quote_denom: required(&args.quote_denom, "quote_denom")?,
        oracle_base: required(&args.oracle_base, "oracle_base")?,
        oracle_quote: required(&args.oracle_quote, "oracle_quote")?,
        oracle_scale_factor: args.oracle_scale_factor,
        oracle_type: oracle_type(&args.oracle_type)?,
        maker_fee_rate: dec(&args.maker_fee_rate)?.to_chain_string(),
        taker_fee_rate: dec(&args.taker_fee_rate)?.to_chain_string(),
        initial_margin_ratio: initial.to_chain_string(),
        maintenance_margin_ratio: maintenance.to_chain_string(),
        min_price_tick_size: positive(&args.min_price_tick, "min_price_tick")?.to_chain_string(),
        min_quantity_tick_size: positive(&args.min_quantity_tick, "min_quantity_tick")?.to_chain_string(),
        min_notional: dec(&args.min_notional_size)?.to_chain_string(),
    })
}

#[derive(Debug, Clone)]
pub struct Exchange {
    pipeline: Arc<TxPipeline>,
}

impl Exchange {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn launch_instant_spot_market(&self, args: SpotMarketLaunchArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_instant_spot_market_launch(self.pipeline.identity().address(), &args)?;
        tracing::info!(ticker = %msg.ticker, "Launching spot market");
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn launch_instant_perp_market(&self, args: PerpMarketLaunchArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_instant_perpetual_market_launch(self.pipeline.identity().address(), &args)?;
        tracing::info!(ticker = %msg.ticker, "Launching perpetual market");
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn opt_out_trade_earn_rewards(&self) -> ProducerResult<TxOutcome> {
        let msg = MsgRewardsOptOut {
            sender: self.pipeline.identity().address().to_string(),
        };
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn perp_args() -> PerpMarketLaunchArgs {
        serde_json::from_value(json!({
            "ticker": "RLY/USDT PERP",
            "quote_denom": "peggy0xdAC17F958D2ee523a2206206994597C13D831ec7",
            "oracle_base": "RLY",
            "oracle_quote": "USDT",
            "oracle_scale_factor": 6,
            "oracle_type": "Band",
            "maker_fee_rate": "0.0005",
            "taker_fee_rate": "0.001",
            "initial_margin_ratio": "0.33",
            "maintenance_margin_ratio": "0.095",
            "min_price_tick": "0.001",
            "min_quantity_tick": 0.01,
            "min_notional_size": "1",
        }))
        .unwrap()
    }

    #[test]
    fn test_spot_market_launch() {
        let args: SpotMarketLaunchArgs = serde_json::from_value(json!({
            "ticker": "RLY/INJ",
            "base": "factory/inj1creator/rly",
            "quote": "inj",
            "min_price_tick": "0.01",
            "min_quantity_tick": "1",
            "min_notional": "0",
        }))
        .unwrap();

        let msg = msg_instant_spot_market_launch("inj1creator", &args).unwrap();
        assert_eq!(msg.base_denom, "factory/inj1creator/rly");
        assert_eq!(msg.min_price_tick_size, "10000000000000000");
        assert_eq!(msg.min_quantity_tick_size, "1000000000000000000");
        assert_eq!(msg.min_notional, "0");
        assert_eq!(msg.to_any().type_url, MsgInstantSpotMarketLaunch::TYPE_URL);
    }

    #[test]
    fn test_spot_launch_validation() {
        let base = json!({
            "ticker": "INJ/INJ",
            "base": "inj",
            "quote": "inj",
            "min_price_tick": "0.01",
            "min_quantity_tick": "1",
            "min_notional": "0",
        });
        let same: SpotMarketLaunchArgs = serde_json::from_value(base.clone()).unwrap();
        assert!(msg_instant_spot_market_launch("inj1creator", &same).is_err());

        let mut zero_tick = base;
        zero_tick["quote"] = json!("peggy0xusdt");
        zero_tick["min_price_tick"] = json!("0");
        let zero_tick: SpotMarketLaunchArgs = serde_json::from_value(zero_tick).unwrap();
        assert!(msg_instant_spot_market_launch("inj1creator", &zero_tick).is_err());
    }

    #[test]
    fn test_perp_market_launch() {
        let msg = msg_instant_perpetual_market_launch("inj1creator", &perp_args()).unwrap();

        assert_eq!(msg.oracle_type, 1);
        assert_eq!(msg.oracle_scale_factor, 6);
        assert_eq!(msg.maker_fee_rate, "500000000000000");
        assert_eq!(msg.initial_margin_ratio, "330000000000000000");
        assert_eq!(msg.maintenance_margin_ratio, "95000000000000000");
        assert_eq!(msg.min_quantity_tick_size, "10000000000000000");
        assert_eq!(
            MsgInstantPerpetualMarketLaunch::decode(msg.to_any().value.as_slice()).unwrap(),
            msg
        );
    }

    #[test]
    fn test_perp_margin_ratios_are_ordered() {
        let mut args = perp_args();
        args.maintenance_margin_ratio = "0.5".into();
        assert!(msg_instant_perpetual_market_launch("inj1creator", &args).is_err());
    }

    #[test]
    fn test_oracle_type_names() {
        assert_eq!(oracle_type("pricefeed").unwrap(), 2);
        assert_eq!(oracle_type("Pyth").unwrap(), 9);
        assert!(oracle_type("tea leaves").is_err());
    }
}
