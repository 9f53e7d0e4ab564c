//! `pmgate-auth` — the gateway's admit/deny core.
//!
//! This crate is intentionally decoupled from HTTP and storage: requests come
//! in as [`RequestDescriptor`]s, roles and employees through the lookup traits
//! in [`store`].

pub mod authorize;
pub mod claims;
pub mod decision;
pub mod permissions;
pub mod principal;
pub mod resolve;
pub mod roles;
pub mod services;
pub mod store;
pub mod token;

#[cfg(test)]
mod testing;

pub use authorize::{MatchOutcome, find_grant, is_authorized};
pub use claims::{GatewayClaims, TokenError, validate_claims};
pub use decision::{AuthzError, Authorizer, Decision, Grant, Rejection, RequestDescriptor, RequestTarget};
pub use permissions::Permission;
pub use principal::{Caller, CallerType};
pub use resolve::{IdentityResolver, Resolution};
pub use roles::{Employee, GUEST_ROLE, Role};
pub use services::{ServiceAllowlist, UnknownCallerPolicy};
pub use store::{EmployeeStore, RoleStore, StoreError};
pub use token::{Hs256TokenValidator, TokenSigner, TokenValidator};
