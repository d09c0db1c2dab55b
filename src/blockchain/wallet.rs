//! Signing identity: key loading, address derivation and signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::primitives::{keccak256, Address};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use bech32::{Bech32, Hrp};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "INJ_RELAY_PRIVATE_KEY";

/// Human-readable part of account addresses.
pub const ACCOUNT_PREFIX: &str = "inj";

/// Keypair and on-chain address derived from a secret seed.
///
/// Immutable once derived. Signing follows the `ethsecp256k1` scheme:
/// keccak256 over the payload, 64-byte `r || s` signature.
#[derive(Clone)]
pub struct SigningIdentity {
    signer: PrivateKeySigner,
    /// Compressed SEC1 public key (33 bytes).
    public_key: Vec<u8>,
    address: String,
}

impl SigningIdentity {
    /// Derive an identity from a hex-encoded 32-byte seed (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        if key_hex.len() != 64 || !key_hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BlockchainError::InvalidKey(
                "expected 32 bytes of hex".to_string(),
            ));
        }

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::InvalidKey(format!("Invalid private key format: {}", e)))?;

        let public_key = signer
            .credential()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let address = bech32_address(signer.address())?;

        tracing::info!(address = %address, "Signing identity initialized");

        Ok(Self {
            signer,
            public_key,
            address,
        })
    }

    /// Load the identity from `INJ_RELAY_PRIVATE_KEY`.
    pub fn from_env() -> BlockchainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::InvalidKey(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// Bech32 account address (`inj1...`).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The same account as a 20-byte hex address.
    pub fn eth_address(&self) -> Address {
        self.signer.address()
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Exchange subaccount id: hex address followed by a 12-byte index.
    pub fn subaccount_id(&self, index: u32) -> String {
        format!("0x{}{:024x}", hex::encode(self.eth_address().as_slice()), index)
    }

    /// Sign arbitrary bytes, returning the 64-byte `r || s` signature.
    pub fn sign(&self, payload: &[u8]) -> BlockchainResult<Vec<u8>> {
        let hash = keccak256(payload);
        let signature = self
            .signer
            .sign_hash_sync(&hash)
            .map_err(|e| BlockchainError::Encoding(format!("Signing failed: {}", e)))?;
        Ok(signature.as_bytes()[..64].to_vec())
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn bech32_address(address: Address) -> BlockchainResult<String> {
    let hrp = Hrp::parse(ACCOUNT_PREFIX)
        .map_err(|e| BlockchainError::Encoding(format!("Invalid address prefix: {}", e)))?;
    bech32::encode::<Bech32>(hrp, address.as_slice())
        .map_err(|e| BlockchainError::Encoding(format!("Address encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_identity_from_private_key() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            identity.eth_address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert!(identity.address().starts_with("inj1"));
        assert_eq!(identity.address().len(), 42);
    }

    #[test]
    fn test_identity_with_0x_prefix() {
        let plain = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let prefixed = SigningIdentity::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(plain.address(), prefixed.address());
    }

    #[test]
    fn test_invalid_private_key() {
        let non_hex = "zz".repeat(32);
        for bad in ["", "invalid_key", "0x1234", non_hex.as_str()] {
            let err = SigningIdentity::from_private_key(bad).unwrap_err();
            assert!(matches!(err, BlockchainError::InvalidKey(_)), "{bad}");
        }
    }

    #[test]
    fn test_public_key_is_compressed() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(identity.public_key().len(), 33);
        assert!(matches!(identity.public_key()[0], 0x02 | 0x03));
    }

    #[test]
    fn test_sign_is_deterministic_per_payload() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let first = identity.sign(b"sign doc one").unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, identity.sign(b"sign doc one").unwrap());
        assert_ne!(first, identity.sign(b"sign doc two").unwrap());
    }

    #[test]
    fn test_subaccount_id() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let id = identity.subaccount_id(1);
        assert_eq!(id.len(), 2 + 40 + 24);
        assert!(id.starts_with("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!(id.ends_with("000000000000000000000001"));
    }

    #[test]
    fn test_debug_hides_key() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
        assert!(debug.contains("inj1"));
    }
}
