//! Gas limit and fee arithmetic.

use crate::blockchain::network::NetworkProfile;
use crate::blockchain::proto::Coin;

/// Priced gas for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    pub gas_limit: u64,
    /// `gas_limit * gas_price`, in base units of `denom`.
    pub amount: u128,
    pub denom: String,
    /// Operator-facing rendering, e.g. `"0.000057 INJ"`. Never parsed back.
    pub display: String,
}

impl FeeQuote {
    pub fn coins(&self) -> Vec<Coin> {
        vec![Coin::new(self.amount, self.denom.clone())]
    }
}

/// Simulated usage plus a fixed headroom of twice the buffer.
pub fn gas_limit(gas_used: u64, gas_fee_buffer: u64) -> u64 {
    gas_used.saturating_add(gas_fee_buffer.saturating_mul(2))
}

pub fn fee_amount(gas_limit: u64, gas_price: u64) -> u128 {
    u128::from(gas_limit) * u128::from(gas_price)
}

/// Render base units as a decimal in whole units with trailing zeros trimmed.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Price a simulated gas usage on `network`.
pub fn quote(gas_used: u64, network: &NetworkProfile) -> FeeQuote {
    let gas_limit = gas_limit(gas_used, network.gas_fee_buffer);
    let amount = fee_amount(gas_limit, network.gas_price);
    FeeQuote {
        gas_limit,
        amount,
        denom: network.fee_denom.clone(),
        display: format!("{} {}", format_units(amount, network.fee_decimals), network.fee_symbol),
    }
}
