//! HTTP edge of the gateway: configuration, the authorization middleware and
//! router wiring.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
