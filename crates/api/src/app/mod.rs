//! HTTP application wiring (Axum router + authorizer wiring).
//!
//! - `routes/`: the gateway's own endpoints and the downstream placeholder
//! - `errors.rs`: consistent JSON error responses for non-authorization errors

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use pmgate_auth::{Authorizer, EmployeeStore, Hs256TokenValidator, IdentityResolver, RoleStore, ServiceAllowlist};

use crate::config::GatewayConfig;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the authorizer from configuration and an identity store.
pub fn build_authorizer<S>(config: &GatewayConfig, store: Arc<S>) -> Authorizer
where
    S: RoleStore + EmployeeStore + 'static,
{
    let validator = Arc::new(Hs256TokenValidator::new(config.jwt_secret.as_bytes()));
    let allowlist = ServiceAllowlist::default().with_unknown_callers(config.unknown_callers);
    let resolver = IdentityResolver::new(store.clone(), store);

    Authorizer::new(validator, allowlist, resolver).with_public_paths(config.public_paths.iter().cloned())
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `upstream` receives every request the authorizer admits; `/health` is
/// served by the gateway itself and is not authorized. The authorizer wraps
/// the upstream router as a whole service, so paths the upstream has no route
/// for (including `/`) are authorized before its fallback answers.
pub fn build_app(authorizer: Arc<Authorizer>, upstream: Router) -> Router {
    let auth_state = middleware::AuthState { authorizer };

    let protected = ServiceBuilder::new()
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::authorize_middleware,
        ))
        .service(upstream);

    Router::new()
        .route("/health", get(routes::system::health))
        .fallback_service(protected)
}
