//! Transaction building and signing.
//!
//! # Responsibilities
//! - Assemble body, auth info and sign doc for a message batch
//! - Sign with the identity's key (`SIGN_MODE_DIRECT`)
//! - Produce the raw bytes the node simulates or broadcasts

use prost::Message;

use crate::blockchain::proto::{
    Any, AuthInfo, Coin, Fee, ModeInfo, ModeInfoSingle, PubKey, SignDoc, SignerInfo, TxBody, TxRaw,
    TypedMessage, SIGN_MODE_DIRECT,
};
use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::SigningIdentity;

/// A transaction under construction.
///
/// Starts as the provisional form used for simulation (no gas, no fee coins,
/// no timeout height) and is rebuilt with pricing before the final signature.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    messages: Vec<Any>,
    account_number: u64,
    sequence: u64,
    chain_id: String,
    gas_limit: u64,
    fee: Vec<Coin>,
    timeout_height: u64,
    memo: String,
}

impl PendingTransaction {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            account_number: 0,
            sequence: 0,
            chain_id: chain_id.into(),
            gas_limit: 0,
            fee: Vec::new(),
            timeout_height: 0,
            memo: String::new(),
        }
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Any>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_account_number(mut self, account_number: u64) -> Self {
        self.account_number = account_number;
        self
    }

    pub fn with_gas(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_fee(mut self, fee: Vec<Coin>) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_timeout_height(mut self, timeout_height: u64) -> Self {
        self.timeout_height = timeout_height;
        self
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn messages(&self) -> &[Any] {
        &self.messages
    }

    fn body_bytes(&self) -> Vec<u8> {
        TxBody {
            messages: self.messages.clone(),
            memo: self.memo.clone(),
            timeout_height: self.timeout_height,
        }
        .encode_to_vec()
    }

    fn auth_info_bytes(&self, public_key: &[u8]) -> Vec<u8> {
        let signer_info = SignerInfo {
            public_key: Some(PubKey { key: public_key.to_vec() }.to_any()),
            mode_info: Some(ModeInfo {
                single: Some(ModeInfoSingle { mode: SIGN_MODE_DIRECT }),
            }),
            sequence: self.sequence,
        };

        AuthInfo {
            signer_infos: vec![signer_info],
            fee: Some(Fee {
                amount: self.fee.clone(),
                gas_limit: self.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        }
        .encode_to_vec()
    }

    /// Canonical bytes covered by the signature.
    pub fn sign_doc_bytes(&self, public_key: &[u8]) -> Vec<u8> {
        SignDoc {
            body_bytes: self.body_bytes(),
            auth_info_bytes: self.auth_info_bytes(public_key),
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
        }
        .encode_to_vec()
    }

    /// Sign with `identity` and return the raw transaction bytes.
    pub fn sign(&self, identity: &SigningIdentity) -> BlockchainResult<Vec<u8>> {
        let body_bytes = self.body_bytes();
        let auth_info_bytes = self.auth_info_bytes(identity.public_key());

        let sign_doc = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
        };
        let signature = identity.sign(&sign_doc.encode_to_vec())?;

        Ok(TxRaw {
            body_bytes,
            auth_info_bytes,
            signatures: vec![signature],
        }
        .encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn message() -> Any {
        Any {
            type_url: "/cosmos.bank.v1beta1.MsgSend".into(),
            value: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_raw_bytes_carry_sequence_and_fee() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = PendingTransaction::new("injective-888")
            .with_messages([message()])
            .with_sequence(4)
            .with_account_number(7)
            .with_gas(114_000)
            .with_fee(vec![Coin::new(57_000_000_000_000u64, "inj")])
            .with_timeout_height(130);

        let raw = TxRaw::decode(tx.sign(&identity).unwrap().as_slice()).unwrap();
        assert_eq!(raw.signatures.len(), 1);
        assert_eq!(raw.signatures[0].len(), 64);

        let auth = AuthInfo::decode(raw.auth_info_bytes.as_slice()).unwrap();
        assert_eq!(auth.signer_infos[0].sequence, 4);
        let fee = auth.fee.unwrap();
        assert_eq!(fee.gas_limit, 114_000);
        assert_eq!(fee.amount[0].amount, "57000000000000");

        let body = TxBody::decode(raw.body_bytes.as_slice()).unwrap();
        assert_eq!(body.timeout_height, 130);
        assert_eq!(body.messages, vec![message()]);
    }

    #[test]
    fn test_pricing_changes_signed_payload() {
        let identity = SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let provisional = PendingTransaction::new("injective-1")
            .with_messages([message()])
            .with_account_number(7);
        let priced = provisional.clone().with_gas(100_000);

        assert_ne!(
            provisional.sign_doc_bytes(identity.public_key()),
            priced.sign_doc_bytes(identity.public_key())
        );
        assert_ne!(provisional.sign(&identity).unwrap(), priced.sign(&identity).unwrap());
    }
}
