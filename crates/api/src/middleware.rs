use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use pmgate_auth::{Authorizer, Decision, Rejection, RequestDescriptor, TokenError};

use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub authorizer: Arc<Authorizer>,
}

/// Admit or reject a request before it reaches the downstream router.
///
/// Every deny produces the same fixed 401; the reason only goes to the log.
pub async fn authorize_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let authorization = match credential(req.headers()) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %req.uri().path(), reason = "token", error = %err, "request denied");
            return unauthorized_response();
        }
    };

    let descriptor = RequestDescriptor {
        method: req.method().as_str().to_string(),
        path: req.uri().path().to_string(),
        authorization,
    };

    let decision = state.authorizer.decide(&descriptor, Utc::now());
    if let Some(rejection) = decision.rejection() {
        return rejection_response(rejection);
    }
    if let Decision::Allow(grant) = &decision {
        req.extensions_mut().insert(CallerContext::from(grant));
    }
    next.run(req).await
}

/// Raw `Authorization` value. A missing header is the anonymous path.
fn credential(headers: &HeaderMap) -> Result<Option<String>, TokenError> {
    match headers.get(header::AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.to_string()))
            .map_err(|_| TokenError::Malformed("authorization header is not visible ASCII".to_string())),
    }
}

pub fn rejection_response(rejection: Rejection) -> Response {
    let status = StatusCode::from_u16(rejection.status).unwrap_or(StatusCode::UNAUTHORIZED);
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(rejection.content_type))],
        rejection.body,
    )
        .into_response()
}

pub fn unauthorized_response() -> Response {
    rejection_response(Rejection::UNAUTHORIZED)
}
