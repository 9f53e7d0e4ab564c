use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use pmgate_core::CallerId;

/// Coarse identity class of a caller, taken from the token's `type` claim.
///
/// The claim is free text issued by the login flow; values other than the
/// four known classes are kept (lower-cased) so that policy layers can decide
/// what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallerType {
    Guest,
    User,
    Vendor,
    Employee,
    Other(String),
}

impl CallerType {
    /// Parse a caller type case-insensitively.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "guest" => Self::Guest,
            "user" => Self::User,
            "vendor" => Self::Vendor,
            "employee" => Self::Employee,
            _ => Self::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Vendor => "vendor",
            Self::Employee => "employee",
            Self::Other(s) => s,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl core::fmt::Display for CallerType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CallerType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<CallerType> for String {
    fn from(value: CallerType) -> Self {
        value.as_str().to_string()
    }
}

/// The identity extracted from a request's credential.
///
/// Built fresh for every request and never persisted. Anonymous requests get
/// [`Caller::guest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub caller_type: CallerType,
    pub id: CallerId,
    /// Verified claim set of the token (empty for anonymous callers).
    pub raw_claims: Map<String, Value>,
}

impl Caller {
    pub fn guest() -> Self {
        Self {
            caller_type: CallerType::Guest,
            id: CallerId::ANONYMOUS,
            raw_claims: Map::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.raw_claims.is_empty() && self.caller_type.is_guest()
    }
}
