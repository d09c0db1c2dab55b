//! Exchange trading: spot and derivative orders and their cancellation.
//!
//! # Units
//! Prices and quantities are taken in chain units and encoded as 18-decimal
//! `LegacyDec`. Derivative margin is `price * quantity / leverage`.
//!
//! Market orders need a worst acceptable price; mid-price discovery is left
//! to the caller.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::decimal::Dec;
use crate::blockchain::proto::TypedMessage;
use crate::blockchain::wallet::SigningIdentity;
use crate::messages::{
    normalize_order_hash, positive, string_or_number, validate_market_id, ProducerError, ProducerResult,
};
use crate::pipeline::{TxOutcome, TxPipeline};

/// Cancel mask value meaning "any order type".
const ORDER_MASK_ANY: i32 = 1;

#[derive(Clone, PartialEq, Eq, Message)]
pub struct OrderInfo {
    #[prost(string, tag = "1")]
    pub subaccount_id: String,
    #[prost(string, tag = "2")]
    pub fee_recipient: String,
    #[prost(string, tag = "3")]
    pub price: String,
    #[prost(string, tag = "4")]
    pub quantity: String,
    #[prost(string, tag = "5")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct SpotOrder {
    #[prost(string, tag = "1")]
    pub market_id: String,
    #[prost(message, optional, tag = "2")]
    pub order_info: Option<OrderInfo>,
    #[prost(int32, tag = "3")]
    pub order_type: i32,
    #[prost(string, tag = "4")]
    pub trigger_price: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct DerivativeOrder {
    #[prost(string, tag = "1")]
    pub market_id: String,
    #[prost(message, optional, tag = "2")]
    pub order_info: Option<OrderInfo>,
    #[prost(int32, tag = "3")]
    pub order_type: i32,
    #[prost(string, tag = "4")]
    pub margin: String,
    #[prost(string, tag = "5")]
    pub trigger_price: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCreateSpotLimitOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub order: Option<SpotOrder>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCreateSpotMarketOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub order: Option<SpotOrder>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCreateDerivativeLimitOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub order: Option<DerivativeOrder>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCreateDerivativeMarketOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub order: Option<DerivativeOrder>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCancelSpotOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub market_id: String,
    #[prost(string, tag = "3")]
    pub subaccount_id: String,
    #[prost(string, tag = "4")]
    pub order_hash: String,
    #[prost(string, tag = "5")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCancelDerivativeOrder {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub market_id: String,
    #[prost(string, tag = "3")]
    pub subaccount_id: String,
    #[prost(string, tag = "4")]
    pub order_hash: String,
    #[prost(int32, tag = "5")]
    pub order_mask: i32,
    #[prost(string, tag = "6")]
    pub cid: String,
}

impl TypedMessage for MsgCreateSpotLimitOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCreateSpotLimitOrder";
}

impl TypedMessage for MsgCreateSpotMarketOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCreateSpotMarketOrder";
}

impl TypedMessage for MsgCreateDerivativeLimitOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCreateDerivativeLimitOrder";
}

impl TypedMessage for MsgCreateDerivativeMarketOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCreateDerivativeMarketOrder";
}

impl TypedMessage for MsgCancelSpotOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCancelSpotOrder";
}

impl TypedMessage for MsgCancelDerivativeOrder {
    const TYPE_URL: &'static str = "/injective.exchange.v1beta1.MsgCancelDerivativeOrder";
}

/// Order direction. `*_po` variants are post-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    #[serde(alias = "BUY")]
    Buy,
    #[serde(alias = "SELL")]
    Sell,
    #[serde(alias = "BUY_PO")]
    BuyPo,
    #[serde(alias = "SELL_PO")]
    SellPo,
}

impl OrderSide {
    /// `injective.exchange.v1beta1.OrderType` value.
    pub fn order_type(self) -> i32 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => 2,
            OrderSide::BuyPo => 7,
            OrderSide::SellPo => 8,
        }
    }

    pub fn is_post_only(self) -> bool {
        matches!(self, OrderSide::BuyPo | OrderSide::SellPo)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotOrderArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub quantity: String,
    pub side: OrderSide,
    pub market_id: String,
    #[serde(default)]
    pub subaccount_idx: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DerivativeOrderArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub quantity: String,
    pub side: OrderSide,
    pub market_id: String,
    #[serde(default)]
    pub subaccount_idx: u32,
    #[serde(deserialize_with = "string_or_number")]
    pub leverage: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderArgs {
    pub market_id: String,
    #[serde(default)]
    pub subaccount_idx: u32,
    pub order_hash: String,
}

fn new_cid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn reject_post_only_market(side: OrderSide) -> ProducerResult<()> {
    if side.is_post_only() {
        return Err(ProducerError::Unsupported(
            "post-only side is not valid for a market order".to_string(),
        ));
    }
    Ok(())
}

fn order_info(identity: &SigningIdentity, subaccount_idx: u32, price: &Dec, quantity: &Dec) -> OrderInfo {
    OrderInfo {
        subaccount_id: identity.subaccount_id(subaccount_idx),
        fee_recipient: identity.address().to_string(),
        price: price.to_chain_string(),
        quantity: quantity.to_chain_string(),
        cid: new_cid(),
    }
}

fn spot_order(identity: &SigningIdentity, args: &SpotOrderArgs) -> ProducerResult<SpotOrder> {
    let price = positive(&args.price, "price")?;
    let quantity = positive(&args.quantity, "quantity")?;
    Ok(SpotOrder {
        market_id: validate_market_id(&args.market_id)?,
        order_info: Some(order_info(identity, args.subaccount_idx, &price, &quantity)),
        order_type: args.side.order_type(),
        trigger_price: Dec::ZERO.to_chain_string(),
    })
}

/// `price * quantity / leverage`, the collateral posted for a non-reduce-only order.
pub fn derivative_margin(price: &Dec, quantity: &Dec, leverage: &Dec) -> ProducerResult<Dec> {
    Ok(price.checked_mul(quantity)?.checked_div(leverage)?)
}

fn derivative_order(identity: &SigningIdentity, args: &DerivativeOrderArgs) -> ProducerResult<DerivativeOrder> {
    let price = positive(&args.price, "price")?;
    let quantity = positive(&args.quantity, "quantity")?;
    let leverage = positive(&args.leverage, "leverage")?;
    let margin = derivative_margin(&price, &quantity, &leverage)?;
    Ok(DerivativeOrder {
        market_id: validate_market_id(&args.market_id)?,
        order_info: Some(order_info(identity, args.subaccount_idx, &price, &quantity)),
        order_type: args.side.order_type(),
        margin: margin.to_chain_string(),
        trigger_price: Dec::ZERO.to_chain_string(),
    })
}

pub fn msg_spot_limit_order(identity: &SigningIdentity, args: &SpotOrderArgs) -> ProducerResult<MsgCreateSpotLimitOrder> {
    Ok(MsgCreateSpotLimitOrder {
        sender: identity.address().to_string(),
        order: Some(spot_order(identity, args)?),
    })
}

pub fn msg_spot_market_order(identity: &SigningIdentity, args: &SpotOrderArgs) -> ProducerResult<MsgCreateSpotMarketOrder> {
    reject_post_only_market(args.side)?;
    Ok(MsgCreateSpotMarketOrder {
        sender: identity.address().to_string(),
        order: Some(spot_order(identity, args)?),
    })
}

pub fn msg_derivative_limit_order(
    identity: &SigningIdentity,
    args: &DerivativeOrderArgs,
) -> ProducerResult<MsgCreateDerivativeLimitOrder> {
    Ok(MsgCreateDerivativeLimitOrder {
        sender: identity.address().to_string(),
        order: Some(derivative_order(identity, args)?),
    })
}

pub fn msg_derivative_market_order(
    identity: &SigningIdentity,
    args: &DerivativeOrderArgs,
) -> ProducerResult<MsgCreateDerivativeMarketOrder> {
    reject_post_only_market(args.side)?;
    Ok(MsgCreateDerivativeMarketOrder {
        sender: identity.address().to_string(),
        order: Some(derivative_order(identity, args)?),
    })
}

pub fn msg_cancel_spot_order(identity: &SigningIdentity, args: &CancelOrderArgs) -> ProducerResult<MsgCancelSpotOrder> {
    Ok(MsgCancelSpotOrder {
        sender: identity.address().to_string(),
        market_id: validate_market_id(&args.market_id)?,
        subaccount_id: identity.subaccount_id(args.subaccount_idx),
        order_hash: normalize_order_hash(&args.order_hash)?,
        cid: String::new(),
    })
}

pub fn msg_cancel_derivative_order(
    identity: &SigningIdentity,
    args: &CancelOrderArgs,
) -> ProducerResult<MsgCancelDerivativeOrder> {
    Ok(MsgCancelDerivativeOrder {
        sender: identity.address().to_string(),
        market_id: validate_market_id(&args.market_id)?,
        subaccount_id: identity.subaccount_id(args.subaccount_idx),
        order_hash: normalize_order_hash(&args.order_hash)?,
        order_mask: ORDER_MASK_ANY,
        cid: String::new(),
    })
}

#[derive(Debug, Clone)]
pub struct Trader {
    pipeline: Arc<TxPipeline>,
}

impl Trader {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    async fn submit(&self, msg: impl TypedMessage) -> TxOutcome {
        self.pipeline.build_and_broadcast(msg.to_any()).await
    }

    pub async fn place_spot_limit_order(&self, args: SpotOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_spot_limit_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }

    pub async fn place_spot_market_order(&self, args: SpotOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_spot_market_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }

    pub async fn place_derivative_limit_order(&self, args: DerivativeOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_derivative_limit_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }

    pub async fn place_derivative_market_order(&self, args: DerivativeOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_derivative_market_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }

    pub async fn cancel_spot_limit_order(&self, args: CancelOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_cancel_spot_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }

    pub async fn cancel_derivative_limit_order(&self, args: CancelOrderArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_cancel_derivative_order(self.pipeline.identity(), &args)?;
        Ok(self.submit(msg).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const MARKET: &str = "0x0611780ba69656949525013d947713300f56c37b6175e02f26bffa495c3208fe";

    fn identity() -> SigningIdentity {
        SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap()
    }

    fn spot_args(side: &str) -> SpotOrderArgs {
        serde_json::from_value(serde_json::json!({
            "price": "0.000000000021",
            "quantity": 1000000,
            "side": side,
            "market_id": MARKET,
        }))
        .unwrap()
    }

    #[test]
    fn test_side_mapping() {
        assert_eq!(OrderSide::Buy.order_type(), 1);
        assert_eq!(OrderSide::Sell.order_type(), 2);
        assert_eq!(OrderSide::BuyPo.order_type(), 7);
        assert_eq!(OrderSide::SellPo.order_type(), 8);
        assert_eq!(serde_json::from_str::<OrderSide>(r#""SELL_PO""#).unwrap(), OrderSide::SellPo);
        assert!(serde_json::from_str::<OrderSide>(r#""hold""#).is_err());
    }

    #[test]
    fn test_spot_limit_order() {
        let msg = msg_spot_limit_order(&identity(), &spot_args("buy")).unwrap();
        let order = msg.order.unwrap();
        let info = order.order_info.unwrap();

        assert_eq!(order.market_id, MARKET);
        assert_eq!(order.order_type, 1);
        assert_eq!(order.trigger_price, "0");
        assert_eq!(info.price, "21000000");
        assert_eq!(info.quantity, "1000000000000000000000000");
        assert_eq!(info.fee_recipient, msg.sender);
        assert_eq!(uuid::Uuid::parse_str(&info.cid).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_client_order_ids_are_fresh() {
        let a = msg_spot_limit_order(&identity(), &spot_args("sell")).unwrap();
        let b = msg_spot_limit_order(&identity(), &spot_args("sell")).unwrap();
        assert_ne!(a.order.unwrap().order_info.unwrap().cid, b.order.unwrap().order_info.unwrap().cid);
    }

    #[test]
    fn test_market_order_rejects_post_only() {
        assert!(msg_spot_market_order(&identity(), &spot_args("buy_po")).is_err());
        assert!(msg_spot_market_order(&identity(), &spot_args("buy")).is_ok());
    }

    #[test]
    fn test_derivative_margin() {
        let args: DerivativeOrderArgs = serde_json::from_value(serde_json::json!({
            "price": "25.5",
            "quantity": "2",
            "side": "sell",
            "market_id": MARKET,
            "subaccount_idx": 1,
            "leverage": 3,
        }))
        .unwrap();

        let msg = msg_derivative_limit_order(&identity(), &args).unwrap();
        let order = msg.order.unwrap();
        assert_eq!(order.margin, "17000000000000000000");
        assert!(order.order_info.unwrap().subaccount_id.ends_with("1"));

        let mut zero = args.clone();
        zero.leverage = "0".into();
        assert!(msg_derivative_limit_order(&identity(), &zero).is_err());
    }

    #[test]
    fn test_cancel_converts_base64_hash() {
        let hash = [0x5au8; 32];
        let args = CancelOrderArgs {
            market_id: MARKET.into(),
            subaccount_idx: 0,
            order_hash: STANDARD.encode(hash),
        };

        let msg = msg_cancel_derivative_order(&identity(), &args).unwrap();
        assert_eq!(msg.order_hash, format!("0x{}", "5a".repeat(32)));
        assert_eq!(msg.order_mask, 1);

        let spot = msg_cancel_spot_order(&identity(), &args).unwrap();
        assert_eq!(spot.order_hash, msg.order_hash);
        assert_eq!(spot.to_any().type_url, MsgCancelSpotOrder::TYPE_URL);
    }

    #[test]
    fn test_invalid_market_id() {
        let mut args = spot_args("buy");
        args.market_id = "INJ/USDT".into();
        assert!(matches!(
            msg_spot_limit_order(&identity(), &args),
            Err(ProducerError::InvalidMarketId(_))
        ));
    }
}
