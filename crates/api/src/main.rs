use std::sync::Arc;

use anyhow::Context;

use pmgate_api::{app, config::GatewayConfig};
use pmgate_infra::{InMemoryIdentityStore, SeedFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pmgate_observability::init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;

    let store = match &config.seed_file {
        Some(path) => {
            let seed = SeedFile::load(path).context("failed to load identity seed")?;
            InMemoryIdentityStore::from_seed(seed).context("invalid identity seed")?
        }
        None => {
            tracing::warn!("PMGATE_SEED_FILE not set; identity store is empty and requests outside public paths will be denied");
            InMemoryIdentityStore::new()
        }
    };

    let authorizer = Arc::new(app::build_authorizer(&config, Arc::new(store)));
    let router = app::build_app(authorizer, app::routes::upstream::router());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        unknown_callers = ?config.unknown_callers,
        public_paths = config.public_paths.len(),
        "gateway listening"
    );

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
