use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use assistant_gateway::api::{self, ApiState};
use assistant_gateway::auth::TokenService;
use assistant_gateway::config::GatewayConfig;
use assistant_gateway::storage::AccountStore;
use assistant_gateway::upstream::CompletionClient;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = GatewayConfig::from_env()?;

    info!(
        host = %config.server_host,
        port = config.server_port,
        data_dir = %config.data_dir.display(),
        upstream = %config.upstream_base_url,
        "starting assistant gateway"
    );

    let store = Arc::new(AccountStore::new(config.data_dir.clone())?);
    let completion = CompletionClient::new(&config)?;
    let tokens = TokenService::new(&config.token_secret, config.token_ttl_secs)?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = Arc::new(ApiState::new(store, completion, tokens, config));
    let router = api::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("assistant gateway shutting down");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
