//! Request-level admit/deny decision.
//!
//! [`Authorizer`] runs the stages in order (credential, service gate, role
//! resolution, permission matching) and collapses every failure into a deny.
//! Callers turn a deny into [`Rejection::UNAUTHORIZED`] without looking at why.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::authorize::{MatchOutcome, find_grant};
use crate::claims::TokenError;
use crate::resolve::IdentityResolver;
use crate::services::ServiceAllowlist;
use crate::store::StoreError;
use crate::token::TokenValidator;
use crate::{Caller, CallerType};

/// Why a request was denied. Logged, never returned to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid credential: {0}")]
    Token(#[from] TokenError),

    #[error("caller type '{caller_type}' may not reach service '{service}'")]
    ServiceNotAllowed { service: String, caller_type: String },

    #[error("no role resolvable for caller type '{0}'")]
    Resolution(String),

    #[error("no permission grants {method} {path}")]
    NoMatch { method: String, path: String },

    #[error("malformed request path '{0}'")]
    MalformedPath(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::ServiceNotAllowed { .. } => "service_not_allowed",
            Self::Resolution(_) => "resolution",
            Self::NoMatch { .. } => "no_match",
            Self::MalformedPath(_) => "malformed_path",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AuthzError {
    fn from(value: StoreError) -> Self {
        Self::Internal(value.to_string())
    }
}

/// Transport-neutral view of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub path: String,
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            authorization: None,
        }
    }

    pub fn with_authorization(mut self, credential: impl Into<String>) -> Self {
        self.authorization = Some(credential.into());
        self
    }
}

/// A request path split into the target service and the service-relative rest.
///
/// `/pm-orders/orders/7` targets `pm-orders` with relative path `/orders/7`.
/// Paths are not normalized: a dot segment (`.`, `..`, or their `%2e` forms)
/// or an empty interior segment makes the whole path malformed, so the service
/// the gate sees is always the service a normalizing proxy would route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub service: &'a str,
    pub relative_path: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn parse(path: &'a str) -> Result<Self, AuthzError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let malformed = || AuthzError::MalformedPath(path.to_string());

        let mut segments = trimmed.split('/').peekable();
        while let Some(segment) = segments.next() {
            let trailing = segments.peek().is_none();
            if is_dot_segment(segment) || (segment.is_empty() && !trailing) {
                return Err(malformed());
            }
        }

        let split = trimmed.find('/').ok_or_else(malformed)?;
        let service = &trimmed[..split];
        if service.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            service,
            relative_path: &trimmed[split..],
        })
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// A request that passed every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub caller: Caller,
    /// Caller type after resolution (may differ from the token's type).
    pub effective_type: CallerType,
    pub role: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow(Grant),
    /// Public path: authorization was not evaluated.
    Bypass,
    Deny(AuthzError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Deny(_))
    }

    /// Response to send instead of forwarding, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Deny(_) => Some(Rejection::UNAUTHORIZED),
            Self::Allow(_) | Self::Bypass => None,
        }
    }
}

/// Fixed response for denied requests. The body never carries the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static str,
}

impl Rejection {
    pub const UNAUTHORIZED: Rejection = Rejection {
        status: 401,
        content_type: "text/plain;charset=UTF-8",
        body: "Not authorized",
    };
}

/// The per-request authorization pipeline.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Clone)]
pub struct Authorizer {
    validator: Arc<dyn TokenValidator>,
    allowlist: ServiceAllowlist,
    resolver: IdentityResolver,
    public_paths: HashSet<String>,
}

impl Authorizer {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        allowlist: ServiceAllowlist,
        resolver: IdentityResolver,
    ) -> Self {
        Self {
            validator,
            allowlist,
            resolver,
            public_paths: HashSet::new(),
        }
    }

    /// Exact request paths that skip authorization entirely.
    pub fn with_public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Decide a request. Never panics: a fault in any stage is a deny.
    pub fn decide(&self, request: &RequestDescriptor, now: DateTime<Utc>) -> Decision {
        let decision = match panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(request, now))) {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => Decision::Deny(err),
            Err(payload) => Decision::Deny(AuthzError::Internal(panic_message(payload.as_ref()))),
        };

        match &decision {
            Decision::Allow(grant) => tracing::debug!(
                service = %grant.service,
                caller_type = %grant.effective_type,
                caller_id = %grant.caller.id,
                role = %grant.role,
                "request authorized"
            ),
            Decision::Bypass => tracing::debug!(path = %request.path, "public path, authorization skipped"),
            Decision::Deny(err) => tracing::warn!(
                method = %request.method,
                path = %request.path,
                reason = err.kind(),
                error = %err,
                "request denied"
            ),
        }

        decision
    }

    fn evaluate(&self, request: &RequestDescriptor, now: DateTime<Utc>) -> Result<Decision, AuthzError> {
        if self.public_paths.contains(&request.path) {
            return Ok(Decision::Bypass);
        }

        let target = RequestTarget::parse(&request.path)?;
        let caller = self.validator.validate(request.authorization.as_deref(), now)?;

        if !self.allowlist.is_service_allowed(target.service, &caller.caller_type) {
            return Err(AuthzError::ServiceNotAllowed {
                service: target.service.to_string(),
                caller_type: caller.caller_type.to_string(),
            });
        }

        let resolution = self.resolver.resolve(&caller.caller_type, caller.id)?;
        let Some(role) = &resolution.role else {
            return Err(AuthzError::Resolution(resolution.effective_type.to_string()));
        };

        let guest_role = if resolution.effective_type.is_guest() {
            None
        } else {
            self.resolver.guest_role()?
        };
        let permissions = resolution.effective_permissions(guest_role.as_ref());
        tracing::trace!(role = %role, permissions = permissions.len(), "matching permissions");

        match find_grant(&permissions, target.relative_path, &request.method) {
            MatchOutcome::Granted(_) => Ok(Decision::Allow(Grant {
                role: role.name.clone(),
                service: target.service.to_string(),
                effective_type: resolution.effective_type.clone(),
                caller,
            })),
            MatchOutcome::WildcardDenied(_) | MatchOutcome::NoMatch => Err(AuthzError::NoMatch {
                method: request.method.clone(),
                path: request.path.clone(),
            }),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during authorization".to_string()
    }
}
