//! Token factory: create, mint, burn and describe `factory/{creator}/{subdenom}` tokens.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::decimal::parse_base_units;
use crate::blockchain::proto::{Coin, TypedMessage};
use crate::messages::{string_or_number, ProducerError, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgCreateDenom {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub subdenom: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub symbol: String,
    #[prost(uint32, tag = "5")]
    pub decimals: u32,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgMint {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub amount: Option<Coin>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgBurn {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub amount: Option<Coin>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct DenomUnit {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(uint32, tag = "2")]
    pub exponent: u32,
    #[prost(string, repeated, tag = "3")]
    pub aliases: Vec<String>,
}

/// Bank denom metadata.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub description: String,
    #[prost(message, repeated, tag = "2")]
    pub denom_units: Vec<DenomUnit>,
    #[prost(string, tag = "3")]
    pub base: String,
    #[prost(string, tag = "4")]
    pub display: String,
    #[prost(string, tag = "5")]
    pub name: String,
    #[prost(string, tag = "6")]
    pub symbol: String,
    #[prost(string, tag = "7")]
    pub uri: String,
    #[prost(string, tag = "8")]
    pub uri_hash: String,
    #[prost(uint32, tag = "9")]
    pub decimals: u32,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgSetDenomMetadata {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub metadata: Option<Metadata>,
}

impl TypedMessage for MsgCreateDenom {
    const TYPE_URL: &'static str = "/injective.tokenfactory.v1beta1.MsgCreateDenom";
}

impl TypedMessage for MsgMint {
    const TYPE_URL: &'static str = "/injective.tokenfactory.v1beta1.MsgMint";
}

impl TypedMessage for MsgBurn {
    const TYPE_URL: &'static str = "/injective.tokenfactory.v1beta1.MsgBurn";
}

impl TypedMessage for MsgSetDenomMetadata {
    const TYPE_URL: &'static str = "/injective.tokenfactory.v1beta1.MsgSetDenomMetadata";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDenomArgs {
    pub subdenom: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Mint and burn arguments. `amount` is in base units.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAmountArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    pub denom: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenomMetadataArgs {
    /// Full factory denom, `factory/{creator}/{subdenom}`.
    pub denom: String,
    pub subdenom: String,
    pub token_decimals: u32,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub uri_hash: String,
}

pub fn msg_create_denom(sender: &str, args: &CreateDenomArgs) -> ProducerResult<MsgCreateDenom> {
    if args.subdenom.is_empty() || args.subdenom.contains('/') {
        return Err(ProducerError::Unsupported(format!("invalid subdenom '{}'", args.subdenom)));
    }
    Ok(MsgCreateDenom {
        sender: sender.to_string(),
        subdenom: args.subdenom.clone(),
        name: args.name.clone(),
        symbol: args.symbol.clone(),
        decimals: args.decimals,
    })
}

fn factory_coin(args: &TokenAmountArgs) -> ProducerResult<Coin> {
    Ok(Coin::new(parse_base_units(&args.amount)?, args.denom.clone()))
}

pub fn msg_mint(sender: &str, args: &TokenAmountArgs) -> ProducerResult<MsgMint> {
    Ok(MsgMint {
        sender: sender.to_string(),
        amount: Some(factory_coin(args)?),
    })
}

pub fn msg_burn(sender: &str, args: &TokenAmountArgs) -> ProducerResult<MsgBurn> {
    Ok(MsgBurn {
        sender: sender.to_string(),
        amount: Some(factory_coin(args)?),
    })
}

/// Metadata for a denom the sender created: base unit at exponent 0, display
/// unit `subdenom` at `token_decimals`.
pub fn msg_set_denom_metadata(sender: &str, args: &DenomMetadataArgs) -> ProducerResult<MsgSetDenomMetadata> {
    let expected = format!("factory/{}/{}", sender, args.subdenom);
    if args.subdenom.is_empty() || args.denom != expected {
        return Err(ProducerError::Unsupported(format!(
            "denom '{}' is not '{}'",
            args.denom, expected
        )));
    }

    let denom_units = vec![
        DenomUnit {
            denom: args.denom.clone(),
            exponent: 0,
            aliases: vec![format!("micro{}", args.subdenom)],
        },
        DenomUnit {
            denom: args.subdenom.clone(),
            exponent: args.token_decimals,
            aliases: vec![args.subdenom.clone()],
        },
    ];

    Ok(MsgSetDenomMetadata {
        sender: sender.to_string(),
        metadata: Some(Metadata {
            description: args.description.clone(),
            denom_units,
            base: args.denom.clone(),
            display: args.subdenom.clone(),
            name: args.name.clone(),
            symbol: args.symbol.clone(),
            uri: args.uri.clone(),
            uri_hash: args.uri_hash.clone(),
            decimals: args.token_decimals,
        }),
    })
}

#[derive(Debug, Clone)]
pub struct TokenFactory {
    pipeline: Arc<TxPipeline>,
}

impl TokenFactory {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn create_denom(&self, args: CreateDenomArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_create_denom(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn mint(&self, args: TokenAmountArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_mint(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn burn(&self, args: TokenAmountArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_burn(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn set_denom_metadata(&self, args: DenomMetadataArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_set_denom_metadata(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}
