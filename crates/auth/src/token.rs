//! Bearer credential verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde_json::{Map, Value};

use pmgate_core::CallerId;

use crate::claims::{GatewayClaims, TokenError, validate_claims};
use crate::principal::{Caller, CallerType};

/// Turns the raw credential of a request into a [`Caller`].
///
/// An absent credential is the anonymous path and yields [`Caller::guest`].
/// A credential that is present but fails verification is always an error;
/// it must never be downgraded to a guest.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<Caller, TokenError>;
}

/// HS256 validator keyed by the gateway's shared secret.
#[derive(Clone)]
pub struct Hs256TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run in `validate_claims` against the caller-supplied clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    fn decode(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?;
        Ok(data.claims)
    }
}

impl TokenValidator for Hs256TokenValidator {
    fn validate(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<Caller, TokenError> {
        let Some(raw) = credential else {
            return Ok(Caller::guest());
        };

        let token = strip_scheme(raw)?;
        let raw_claims = self.decode(token)?;
        let claims = GatewayClaims::from_map(&raw_claims)?;
        validate_claims(&claims, now)?;

        Ok(Caller {
            caller_type: CallerType::parse(&claims.caller_type),
            id: claims.id,
            raw_claims,
        })
    }
}

/// Accept both `Bearer <jwt>` and a bare compact JWT in the header value.
fn strip_scheme(raw: &str) -> Result<&str, TokenError> {
    let raw = raw.trim();
    let token = match raw.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => raw[7..].trim(),
        _ => raw,
    };
    if token.is_empty() {
        return Err(TokenError::Malformed("empty credential".to_string()));
    }
    Ok(token)
}

/// Mints HS256 gateway tokens with the same secret the validator uses.
///
/// Issuing credentials belongs to the login service; this exists for tests and
/// local tooling.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenSigner {
    /// Default validity of an issued token.
    pub const DEFAULT_LIFETIME_HOURS: i64 = 10;

    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            lifetime: Duration::hours(Self::DEFAULT_LIFETIME_HOURS),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn sign(
        &self,
        caller_type: &str,
        id: CallerId,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = GatewayClaims {
            id,
            caller_type: caller_type.to_string(),
            sub: subject.map(str::to_string),
            iat: Some(now),
            exp: now + self.lifetime,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}
