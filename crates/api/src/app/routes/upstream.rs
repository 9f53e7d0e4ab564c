//! Stand-in for the forwarding proxy.
//!
//! Admitted requests land here when no real upstream is mounted.

use axum::{
    Router,
    http::{StatusCode, Uri},
    response::Response,
    routing::any,
};

use crate::app::errors::json_error;

pub fn router() -> Router {
    Router::new().route("/*path", any(unavailable))
}

async fn unavailable(uri: Uri) -> Response {
    json_error(
        StatusCode::BAD_GATEWAY,
        "upstream_unavailable",
        format!("no upstream configured for {}", uri.path()),
    )
}
