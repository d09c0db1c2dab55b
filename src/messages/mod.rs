//! Domain message producers.
//!
//! # Responsibilities
//! - Decode typed arguments for each chain operation
//! - Build the protobuf message for that operation
//! - Hand exactly one message to the pipeline and return its outcome
//!
//! # Data Flow
//! ```text
//! dispatch (function name + JSON arguments)
//!     → <module>.rs (args struct → Msg*)
//!     → TypedMessage::to_any
//!     → TxPipeline::build_and_broadcast
//! ```
//!
//! Builders (`msg_*`) are pure functions of the sender and arguments so
//! they can be tested without a node.

pub mod account;
pub mod auction;
pub mod authz;
pub mod bank;
pub mod exchange;
pub mod staking;
pub mod token_factory;
pub mod trader;

use base64::{engine::general_purpose::STANDARD, Engine};
use bech32::Hrp;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::blockchain::decimal::{Dec, DecimalError};
use crate::pipeline::TxPipeline;

/// Bech32 prefix of validator operator addresses.
pub const VALIDATOR_PREFIX: &str = "injvaloper";

/// Errors raised while turning arguments into a message.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] DecimalError),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid market id '{0}': expected 0x followed by 64 hex digits")]
    InvalidMarketId(String),

    #[error("Invalid subaccount id '{0}': expected 0x followed by 64 hex digits")]
    InvalidSubaccountId(String),

    #[error("Invalid order hash '{0}'")]
    InvalidOrderHash(String),

    #[error("{0}")]
    Unsupported(String),
}

pub type ProducerResult<T> = Result<T, ProducerError>;

/// All producers bound to one pipeline.
#[derive(Debug, Clone)]
pub struct Modules {
    pub bank: bank::Bank,
    pub staking: staking::Staking,
    pub auction: auction::Auction,
    pub account: account::Accounts,
    pub exchange: exchange::Exchange,
    pub trader: trader::Trader,
    pub authz: authz::Authz,
    pub token_factory: token_factory::TokenFactory,
}

impl Modules {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self {
            bank: bank::Bank::new(pipeline.clone()),
            staking: staking::Staking::new(pipeline.clone()),
            auction: auction::Auction::new(pipeline.clone()),
            account: account::Accounts::new(pipeline.clone()),
            exchange: exchange::Exchange::new(pipeline.clone()),
            trader: trader::Trader::new(pipeline.clone()),
            authz: authz::Authz::new(pipeline.clone()),
            token_factory: token_factory::TokenFactory::new(pipeline),
        }
    }
}

/// Accept `"1.5"` or `1.5` for amount-like fields.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Parse a decimal that must be strictly positive.
pub(crate) fn positive(value: &str, field: &str) -> ProducerResult<Dec> {
    let dec: Dec = value.parse()?;
    if dec.is_zero() {
        return Err(ProducerError::Unsupported(format!("{} must be greater than zero", field)));
    }
    Ok(dec)
}

/// Whole token units (`"1.5"` INJ) to the integer base units a `Coin` carries.
pub(crate) fn whole_units(amount: &str, decimals: u32) -> ProducerResult<String> {
    Ok(positive(amount, "amount")?.to_base_units(decimals)?)
}

/// Check that `address` is bech32 with the given human-readable prefix.
pub fn validate_address(address: &str, prefix: &str) -> ProducerResult<String> {
    let expected = Hrp::parse(prefix).map_err(|_| ProducerError::InvalidAddress(address.to_string()))?;
    match bech32::decode(address) {
        Ok((hrp, data)) if hrp == expected && !data.is_empty() => Ok(address.to_string()),
        _ => Err(ProducerError::InvalidAddress(address.to_string())),
    }
}

fn normalize_id(id: &str) -> Option<String> {
    let trimmed = id.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex_part.len() == 64 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex_part.to_ascii_lowercase()))
    } else {
        None
    }
}

/// Market ids are 32-byte hashes: `0x` plus 64 hex digits. A bare 64-digit
/// form is accepted and prefixed.
pub fn validate_market_id(market_id: &str) -> ProducerResult<String> {
    normalize_id(market_id).ok_or_else(|| ProducerError::InvalidMarketId(market_id.to_string()))
}

pub fn validate_subaccount_id(subaccount_id: &str) -> ProducerResult<String> {
    normalize_id(subaccount_id).ok_or_else(|| ProducerError::InvalidSubaccountId(subaccount_id.to_string()))
}

/// Order hashes arrive either as hex or as base64 from the indexer.
pub fn normalize_order_hash(order_hash: &str) -> ProducerResult<String> {
    if let Some(hex_hash) = normalize_id(order_hash) {
        return Ok(hex_hash);
    }
    let bytes = STANDARD
        .decode(order_hash.trim())
        .map_err(|_| ProducerError::InvalidOrderHash(order_hash.to_string()))?;
    if bytes.len() != 32 {
        return Err(ProducerError::InvalidOrderHash(order_hash.to_string()));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}
