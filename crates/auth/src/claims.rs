use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use pmgate_core::CallerId;

/// Claims carried by a gateway bearer token.
///
/// This is what the login flow puts into a token: the caller's numeric id,
/// its caller type, and the usual subject/issued-at/expiry trio (seconds
/// since the epoch on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayClaims {
    /// Caller id (account or employee id).
    pub id: CallerId,

    /// Caller type as issued (`guest`, `user`, `vendor`, `employee`, ...).
    #[serde(rename = "type")]
    pub caller_type: String,

    /// Subject, usually the account e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, with = "chrono::serde::ts_seconds_option", skip_serializing_if = "Option::is_none")]
    pub iat: Option<DateTime<Utc>>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token is missing the '{0}' claim")]
    MissingClaim(&'static str),

    #[error("token claim '{0}' has an unexpected type")]
    InvalidClaim(&'static str),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl GatewayClaims {
    /// Extract the gateway claims from a verified claim map.
    ///
    /// `id` must be an integer and `type` a string; `exp` is mandatory.
    pub fn from_map(claims: &Map<String, Value>) -> Result<Self, TokenError> {
        let caller_type = match claims.get("type") {
            None | Some(Value::Null) => return Err(TokenError::MissingClaim("type")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(TokenError::InvalidClaim("type")),
        };

        let id = match claims.get("id") {
            None | Some(Value::Null) => return Err(TokenError::MissingClaim("id")),
            Some(v) => v.as_i64().ok_or(TokenError::InvalidClaim("id"))?,
        };

        let sub = match claims.get("sub") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let iat = match claims.get("iat") {
            None | Some(Value::Null) => None,
            Some(v) => Some(timestamp(v, "iat")?),
        };

        let exp = match claims.get("exp") {
            None | Some(Value::Null) => return Err(TokenError::MissingClaim("exp")),
            Some(v) => timestamp(v, "exp")?,
        };

        Ok(Self {
            id: CallerId::new(id),
            caller_type,
            sub,
            iat,
            exp,
        })
    }
}

fn timestamp(value: &Value, claim: &'static str) -> Result<DateTime<Utc>, TokenError> {
    value
        .as_i64()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(TokenError::InvalidClaim(claim))
}

/// Deterministically validate the time window of a token.
///
/// Signature verification happens before this; here only `exp` is checked
/// against `now`. An `iat` ahead of `now` is accepted: tokens are minted by the
/// login service, whose clock may run ahead of the gateway's.
pub fn validate_claims(claims: &GatewayClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if let Some(issued_at) = claims.iat {
        if claims.exp <= issued_at {
            return Err(TokenError::InvalidTimeWindow);
        }
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
