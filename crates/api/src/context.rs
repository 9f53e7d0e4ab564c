use serde::Serialize;

use pmgate_auth::{CallerType, Grant};
use pmgate_core::CallerId;

/// Authorized caller, attached to the request extensions for downstream use.
///
/// Only present on requests that went through authorization; public paths
/// carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerContext {
    caller_id: CallerId,
    token_type: CallerType,
    effective_type: CallerType,
    role: String,
    service: String,
}

impl CallerContext {
    pub fn caller_id(&self) -> CallerId {
        self.caller_id
    }

    /// Caller type as stated by the credential.
    pub fn token_type(&self) -> &CallerType {
        &self.token_type
    }

    /// Caller type the decision was made for.
    pub fn effective_type(&self) -> &CallerType {
        &self.effective_type
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl From<&Grant> for CallerContext {
    fn from(grant: &Grant) -> Self {
        Self {
            caller_id: grant.caller.id,
            token_type: grant.caller.caller_type.clone(),
            effective_type: grant.effective_type.clone(),
            role: grant.role.clone(),
            service: grant.service.clone(),
        }
    }
}
