//! Function dispatch: name + JSON arguments → producer call.
//!
//! # Responsibilities
//! - Resolve a function name to a `(module, operation)` pair
//! - Decode the arguments into the operation's typed struct
//! - Retry once when the pipeline reports a sequence mismatch
//!
//! # Failure Mapping
//! - Unknown function, module or operation → `not_implemented`
//! - Argument decoding or message construction errors → `internal`
//! - Everything else is the pipeline's own outcome

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::messages::{Modules, ProducerError};
use crate::pipeline::{FailureKind, TxOutcome};
use crate::resilience::RetryPolicy;

/// `function name → (module, operation)`. Query entries resolve to a module
/// that has no such operation and report `not_implemented`.
pub static FUNCTION_MAP: &[(&str, (&str, &str))] = &[
    // Trader
    ("place_derivative_limit_order", ("trader", "place_derivative_limit_order")),
    ("place_derivative_market_order", ("trader", "place_derivative_market_order")),
    ("place_spot_limit_order", ("trader", "place_spot_limit_order")),
    ("place_spot_market_order", ("trader", "place_spot_market_order")),
    ("cancel_derivative_limit_order", ("trader", "cancel_derivative_limit_order")),
    ("cancel_spot_limit_order", ("trader", "cancel_spot_limit_order")),
    // Exchange
    ("launch_instant_spot_market", ("exchange", "launch_instant_spot_market")),
    ("launch_instant_perp_market", ("exchange", "launch_instant_perp_market")),
    ("opt_out_trade_earn_rewards", ("exchange", "opt_out_trade_earn_rewards")),
    ("get_subaccount_deposits", ("exchange", "get_subaccount_deposits")),
    ("get_spot_orderbook", ("exchange", "get_spot_orderbook")),
    ("get_derivatives_orderbook", ("exchange", "get_derivatives_orderbook")),
    ("trader_spot_orders", ("exchange", "trader_spot_orders")),
    ("trader_derivative_orders", ("exchange", "trader_derivative_orders")),
    // Account
    ("subaccount_transfer", ("account", "subaccount_transfer")),
    ("external_subaccount_transfer", ("account", "external_subaccount_transfer")),
    ("send_to_eth", ("account", "send_to_eth")),
    ("fetch_tx", ("account", "fetch_tx")),
    // Bank
    ("transfer_funds", ("bank", "transfer_funds")),
    ("query_balances", ("bank", "query_balances")),
    ("query_spendable_balances", ("bank", "query_spendable_balances")),
    ("query_total_supply", ("bank", "query_total_supply")),
    // Staking
    ("stake_tokens", ("staking", "stake_tokens")),
    // Auction
    ("send_bid_auction", ("auction", "send_bid_auction")),
    ("fetch_auctions", ("auction", "fetch_auctions")),
    ("fetch_latest_auction", ("auction", "fetch_latest_auction")),
    // Authz
    ("grant_address_auth", ("authz", "grant_address_auth")),
    ("revoke_address_auth", ("authz", "revoke_address_auth")),
    ("fetch_grants", ("authz", "fetch_grants")),
    // Token factory
    ("create_denom", ("token_factory", "create_denom")),
    ("mint", ("token_factory", "mint")),
    ("burn", ("token_factory", "burn")),
    ("set_denom_metadata", ("token_factory", "set_denom_metadata")),
];

const MODULES: &[&str] = &[
    "bank",
    "staking",
    "auction",
    "account",
    "exchange",
    "trader",
    "authz",
    "token_factory",
];

pub fn lookup(function: &str) -> Option<(&'static str, &'static str)> {
    FUNCTION_MAP
        .iter()
        .find(|(name, _)| *name == function)
        .map(|(_, target)| *target)
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Function {0} not implemented")]
    UnknownFunction(String),

    #[error("Module {0} not available")]
    UnknownModule(String),

    #[error("Operation {operation} not implemented by module {module}")]
    UnknownOperation { module: String, operation: String },

    #[error(transparent)]
    Producer(#[from] ProducerError),
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::Producer(_) => FailureKind::Internal,
            _ => FailureKind::NotImplemented,
        }
    }
}

impl From<DispatchError> for TxOutcome {
    fn from(err: DispatchError) -> Self {
        TxOutcome::failure(err.kind(), err.to_string())
    }
}

fn decode<T: DeserializeOwned>(arguments: &Value) -> Result<T, ProducerError> {
    Ok(T::deserialize(arguments)?)
}

/// Routes named calls to the producers of one pipeline.
#[derive(Debug, Clone)]
pub struct FunctionRouter {
    modules: Modules,
    retry: RetryPolicy,
}

impl FunctionRouter {
    pub fn new(modules: Modules) -> Self {
        Self {
            modules,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Execute `function` with JSON `arguments`. Never fails past the envelope.
    pub async fn execute(&self, function: &str, arguments: &Value) -> TxOutcome {
        let Some((module, operation)) = lookup(function) else {
            tracing::debug!(function, "Unknown function");
            return DispatchError::UnknownFunction(function.to_string()).into();
        };

        let mut attempt = 0;
        loop {
            let outcome = match self.invoke(module, operation, arguments).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(function, module, error = %e, "Dispatch failed");
                    return e.into();
                }
            };

            if !self.retry.should_retry(&outcome, attempt) {
                return outcome;
            }
            attempt += 1;
            let delay = self.retry.delay(attempt);
            tracing::info!(
                function,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying after sequence mismatch"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn invoke(&self, module: &str, operation: &str, args: &Value) -> Result<TxOutcome, DispatchError> {
        let m = &self.modules;
        let outcome = match (module, operation) {
            ("bank", "transfer_funds") => m.bank.transfer_funds(decode(args)?).await?,
            ("staking", "stake_tokens") => m.staking.stake_tokens(decode(args)?).await?,
            ("auction", "send_bid_auction") => m.auction.send_bid_auction(decode(args)?).await?,
            ("account", "subaccount_transfer") => m.account.subaccount_transfer(decode(args)?).await?,
            ("account", "external_subaccount_transfer") => {
                m.account.external_subaccount_transfer(decode(args)?).await?
            }
            ("account", "send_to_eth") => m.account.send_to_eth(decode(args)?).await?,
            ("exchange", "launch_instant_spot_market") => {
                m.exchange.launch_instant_spot_market(decode(args)?).await?
            }
            ("exchange", "launch_instant_perp_market") => {
                m.exchange.launch_instant_perp_market(decode(args)?).await?
            }
            ("exchange", "opt_out_trade_earn_rewards") => m.exchange.opt_out_trade_earn_rewards().await?,
            ("trader", "place_spot_limit_order") => m.trader.place_spot_limit_order(decode(args)?).await?,
            ("trader", "place_spot_market_order") => m.trader.place_spot_market_order(decode(args)?).await?,
            ("trader", "place_derivative_limit_order") => {
                m.trader.place_derivative_limit_order(decode(args)?).await?
            }
            ("trader", "place_derivative_market_order") => {
                m.trader.place_derivative_market_order(decode(args)?).await?
            }
            ("trader", "cancel_spot_limit_order") => m.trader.cancel_spot_limit_order(decode(args)?).await?,
            ("trader", "cancel_derivative_limit_order") => {
                m.trader.cancel_derivative_limit_order(decode(args)?).await?
            }
            ("authz", "grant_address_auth") => m.authz.grant_address_auth(decode(args)?).await?,
            ("authz", "revoke_address_auth") => m.authz.revoke_address_auth(decode(args)?).await?,
            ("token_factory", "create_denom") => m.token_factory.create_denom(decode(args)?).await?,
            ("token_factory", "mint") => m.token_factory.mint(decode(args)?).await?,
            ("token_factory", "burn") => m.token_factory.burn(decode(args)?).await?,
            ("token_factory", "set_denom_metadata") => m.token_factory.set_denom_metadata(decode(args)?).await?,
            (module, operation) if MODULES.contains(&module) => {
                return Err(DispatchError::UnknownOperation {
                    module: module.to_string(),
                    operation: operation.to_string(),
                })
            }
            (module, _) => return Err(DispatchError::UnknownModule(module.to_string())),
        };
        Ok(outcome)
    }
}
