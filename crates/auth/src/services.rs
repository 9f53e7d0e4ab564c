//! Coarse per-service reachability, checked before any permission matching.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use pmgate_core::DomainError;

use crate::CallerType;

/// What to do with caller types that have no entry in the allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCallerPolicy {
    /// Reach every service (the historical fail-open behaviour).
    Allow,
    /// Reach nothing.
    #[default]
    Deny,
}

impl FromStr for UnknownCallerPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(DomainError::validation(format!(
                "unknown caller policy must be 'allow' or 'deny', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ServiceAccess {
    Any,
    Only(HashSet<String>),
}

/// Static mapping from caller type to the backend services it may reach.
///
/// Pure lookup, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAllowlist {
    table: HashMap<String, ServiceAccess>,
    unknown: UnknownCallerPolicy,
}

impl ServiceAllowlist {
    pub fn builder() -> ServiceAllowlistBuilder {
        ServiceAllowlistBuilder::default()
    }

    pub fn unknown_callers(&self) -> UnknownCallerPolicy {
        self.unknown
    }

    pub fn with_unknown_callers(mut self, policy: UnknownCallerPolicy) -> Self {
        self.unknown = policy;
        self
    }

    pub fn is_service_allowed(&self, service: &str, caller_type: &CallerType) -> bool {
        match self.table.get(caller_type.as_str()) {
            Some(ServiceAccess::Any) => true,
            Some(ServiceAccess::Only(services)) => services.contains(service),
            None => self.unknown == UnknownCallerPolicy::Allow,
        }
    }
}

/// The gateway's standard table: shoppers reach the storefront services,
/// vendors the back-office ones, employees everything.
impl Default for ServiceAllowlist {
    fn default() -> Self {
        let storefront = ["pm-accounts", "pm-search", "pm-shopping-cart", "pm-orders"];
        Self::builder()
            .allow(CallerType::Guest, storefront)
            .allow(CallerType::User, storefront)
            .allow(
                CallerType::Vendor,
                ["pm-accounts", "pm-orders", "pm-reports", "pm-products"],
            )
            .allow_any(CallerType::Employee)
            .build()
    }
}

#[derive(Debug, Default)]
pub struct ServiceAllowlistBuilder {
    table: HashMap<String, ServiceAccess>,
    unknown: UnknownCallerPolicy,
}

impl ServiceAllowlistBuilder {
    /// Restrict `caller_type` to exactly `services`, replacing any previous entry.
    pub fn allow<I, S>(mut self, caller_type: CallerType, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let services = services.into_iter().map(Into::into).collect();
        self.table
            .insert(caller_type.as_str().to_string(), ServiceAccess::Only(services));
        self
    }

    pub fn allow_any(mut self, caller_type: CallerType) -> Self {
        self.table
            .insert(caller_type.as_str().to_string(), ServiceAccess::Any);
        self
    }

    pub fn unknown_callers(mut self, policy: UnknownCallerPolicy) -> Self {
        self.unknown = policy;
        self
    }

    pub fn build(self) -> ServiceAllowlist {
        ServiceAllowlist {
            table: self.table,
            unknown: self.unknown,
        }
    }
}
