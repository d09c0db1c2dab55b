//! Static network profiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::BlockchainError;

/// Default gas price in base units (`inj`) per unit of gas.
pub const GAS_PRICE: u64 = 500_000_000;

/// Fixed gas headroom added (twice) on top of the simulated usage.
pub const GAS_FEE_BUFFER_AMOUNT: u64 = 25_000;

/// Decimal exponent of the fee denomination.
pub const FEE_DECIMALS: u32 = 18;

/// Networks the relay can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    #[default]
    Mainnet,
    Testnet,
}

impl FromStr for NetworkKind {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkKind::Mainnet),
            "testnet" => Ok(NetworkKind::Testnet),
            other => Err(BlockchainError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Mainnet => write!(f, "mainnet"),
            NetworkKind::Testnet => write!(f, "testnet"),
        }
    }
}

/// Immutable description of a target network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkProfile {
    pub kind: NetworkKind,
    pub chain_id: String,
    pub fee_denom: String,
    /// Ticker used in operator-facing fee strings.
    pub fee_symbol: String,
    pub fee_decimals: u32,
    pub gas_price: u64,
    pub gas_fee_buffer: u64,
    /// REST gateway endpoint.
    pub lcd_endpoint: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failover_endpoints: Vec<String>,
}

impl NetworkProfile {
    pub fn mainnet() -> Self {
        Self {
            kind: NetworkKind::Mainnet,
            chain_id: "injective-1".to_string(),
            fee_denom: "inj".to_string(),
            fee_symbol: "INJ".to_string(),
            fee_decimals: FEE_DECIMALS,
            gas_price: GAS_PRICE,
            gas_fee_buffer: GAS_FEE_BUFFER_AMOUNT,
            lcd_endpoint: "https://sentry.lcd.injective.network:443".to_string(),
            failover_endpoints: Vec::new(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            kind: NetworkKind::Testnet,
            chain_id: "injective-888".to_string(),
            lcd_endpoint: "https://testnet.sentry.lcd.injective.network:443".to_string(),
            ..Self::mainnet()
        }
    }

    pub fn for_kind(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Mainnet => Self::mainnet(),
            NetworkKind::Testnet => Self::testnet(),
        }
    }

    pub fn is_mainnet(&self) -> bool {
        self.kind == NetworkKind::Mainnet
    }

    /// Primary endpoint followed by failovers.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.lcd_endpoint.as_str()).chain(self.failover_endpoints.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_kind() {
        assert_eq!("mainnet".parse::<NetworkKind>().unwrap(), NetworkKind::Mainnet);
        assert_eq!(" Testnet ".parse::<NetworkKind>().unwrap(), NetworkKind::Testnet);

        let err = "devnet".parse::<NetworkKind>().unwrap_err();
        assert!(err.to_string().contains("devnet"));
    }

    #[test]
    fn test_profiles() {
        let main = NetworkProfile::mainnet();
        assert!(main.is_mainnet());
        assert_eq!(main.chain_id, "injective-1");
        assert_eq!(main.fee_denom, "inj");

        let test = NetworkProfile::for_kind(NetworkKind::Testnet);
        assert!(!test.is_mainnet());
        assert_eq!(test.chain_id, "injective-888");
        assert_eq!(test.gas_fee_buffer, GAS_FEE_BUFFER_AMOUNT);
    }

    #[test]
    fn test_endpoint_order() {
        let mut profile = NetworkProfile::testnet();
        profile.failover_endpoints.push("http://backup:1317".into());
        let endpoints: Vec<_> = profile.endpoints().collect();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[1], "http://backup:1317");
    }
}
