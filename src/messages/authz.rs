//! Authz module: generic grants to another address.

use prost::Message;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::blockchain::proto::{Any, Timestamp, TypedMessage};
use crate::blockchain::wallet::ACCOUNT_PREFIX;
use crate::messages::{validate_address, ProducerError, ProducerResult};
use crate::pipeline::{TxOutcome, TxPipeline};

#[derive(Clone, PartialEq, Eq, Message)]
pub struct GenericAuthorization {
    #[prost(string, tag = "1")]
    pub msg: String,
}

impl TypedMessage for GenericAuthorization {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.GenericAuthorization";
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct Grant {
    #[prost(message, optional, tag = "1")]
    pub authorization: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub expiration: Option<Timestamp>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgGrant {
    #[prost(string, tag = "1")]
    pub granter: String,
    #[prost(string, tag = "2")]
    pub grantee: String,
    #[prost(message, optional, tag = "3")]
    pub grant: Option<Grant>,
}

impl TypedMessage for MsgGrant {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgGrant";
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgRevoke {
    #[prost(string, tag = "1")]
    pub granter: String,
    #[prost(string, tag = "2")]
    pub grantee: String,
    #[prost(string, tag = "3")]
    pub msg_type_url: String,
}

impl TypedMessage for MsgRevoke {
    const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgRevoke";
}

/// `duration` is the grant lifetime in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantArgs {
    pub grantee_address: String,
    pub msg_type: String,
    pub duration: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeArgs {
    pub grantee_address: String,
    pub msg_type: String,
}

fn validate_msg_type(msg_type: &str) -> ProducerResult<String> {
    if msg_type.starts_with('/') && msg_type.len() > 1 {
        Ok(msg_type.to_string())
    } else {
        Err(ProducerError::Unsupported(format!(
            "message type '{}' must be a full type url such as /cosmos.bank.v1beta1.MsgSend",
            msg_type
        )))
    }
}

pub fn msg_grant(granter: &str, args: &GrantArgs, now_unix: u64) -> ProducerResult<MsgGrant> {
    if args.duration == 0 {
        return Err(ProducerError::Unsupported("grant duration must be positive".to_string()));
    }
    let expires = now_unix
        .checked_add(args.duration)
        .and_then(|secs| i64::try_from(secs).ok())
        .ok_or_else(|| ProducerError::Unsupported("grant duration is too large".to_string()))?;

    let authorization = GenericAuthorization {
        msg: validate_msg_type(&args.msg_type)?,
    };
    Ok(MsgGrant {
        granter: granter.to_string(),
        grantee: validate_address(&args.grantee_address, ACCOUNT_PREFIX)?,
        grant: Some(Grant {
            authorization: Some(authorization.to_any()),
            expiration: Some(Timestamp {
                seconds: expires,
                nanos: 0,
            }),
        }),
    })
}

pub fn msg_revoke(granter: &str, args: &RevokeArgs) -> ProducerResult<MsgRevoke> {
    Ok(MsgRevoke {
        granter: granter.to_string(),
        grantee: validate_address(&args.grantee_address, ACCOUNT_PREFIX)?,
        msg_type_url: validate_msg_type(&args.msg_type)?,
    })
}

#[derive(Debug, Clone)]
pub struct Authz {
    pipeline: Arc<TxPipeline>,
}

impl Authz {
    pub fn new(pipeline: Arc<TxPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn grant_address_auth(&self, args: GrantArgs) -> ProducerResult<TxOutcome> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let msg = msg_grant(self.pipeline.identity().address(), &args, now)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }

    pub async fn revoke_address_auth(&self, args: RevokeArgs) -> ProducerResult<TxOutcome> {
        let msg = msg_revoke(self.pipeline.identity().address(), &args)?;
        Ok(self.pipeline.build_and_broadcast(msg.to_any()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{Bech32, Hrp};

    fn grantee() -> String {
        bech32::encode::<Bech32>(Hrp::parse("inj").unwrap(), &[4u8; 20]).unwrap()
    }

    #[test]
    fn test_msg_grant() {
        let args = GrantArgs {
            grantee_address: grantee(),
            msg_type: "/injective.exchange.v1beta1.MsgCreateSpotLimitOrder".into(),
            duration: 3600,
        };

        let msg = msg_grant("inj1granter", &args, 1_700_000_000).unwrap();
        let grant = msg.grant.clone().unwrap();
        assert_eq!(grant.expiration.unwrap().seconds, 1_700_003_600);

        let authorization = grant.authorization.unwrap();
        assert_eq!(authorization.type_url, GenericAuthorization::TYPE_URL);
        let generic = GenericAuthorization::decode(authorization.value.as_slice()).unwrap();
        assert_eq!(generic.msg, args.msg_type);
        assert_eq!(msg.to_any().type_url, "/cosmos.authz.v1beta1.MsgGrant");
    }

    #[test]
    fn test_grant_validation() {
        let mut args = GrantArgs {
            grantee_address: grantee(),
            msg_type: "MsgSend".into(),
            duration: 60,
        };
        assert!(msg_grant("inj1granter", &args, 0).is_err());

        args.msg_type = "/cosmos.bank.v1beta1.MsgSend".into();
        args.duration = 0;
        assert!(msg_grant("inj1granter", &args, 0).is_err());

        args.duration = u64::MAX;
        assert!(msg_grant("inj1granter", &args, 10).is_err());
    }

    #[test]
    fn test_msg_revoke() {
        let args = RevokeArgs {
            grantee_address: grantee(),
            msg_type: "/cosmos.bank.v1beta1.MsgSend".into(),
        };
        let msg = msg_revoke("inj1granter", &args).unwrap();
        assert_eq!(msg.msg_type_url, "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(MsgRevoke::decode(msg.to_any().value.as_slice()).unwrap(), msg);
    }
}
