//! Gateway configuration, read once from the environment at start-up.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use pmgate_auth::UnknownCallerPolicy;

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    InvalidBindAddr { key: &'static str, value: String },

    #[error("{key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Shared HS256 secret used to verify bearer credentials.
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// JSON seed for the identity store; without it the store starts empty.
    pub seed_file: Option<PathBuf>,
    pub unknown_callers: UnknownCallerPolicy,
    /// Exact request paths that skip authorization.
    pub public_paths: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let unknown_callers = match var("PMGATE_UNKNOWN_CALLERS") {
            None => UnknownCallerPolicy::default(),
            Some(raw) => raw.parse::<UnknownCallerPolicy>().map_err(|e| ConfigError::InvalidValue {
                key: "PMGATE_UNKNOWN_CALLERS",
                message: e.to_string(),
            })?,
        };
        if unknown_callers == UnknownCallerPolicy::Allow {
            tracing::warn!("unlisted caller types may reach every service");
        }

        let public_paths = var("PMGATE_PUBLIC_PATHS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            bind_addr,
            seed_file: var("PMGATE_SEED_FILE").map(PathBuf::from),
            unknown_callers,
            public_paths,
        })
    }
}
