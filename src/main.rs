use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use roadmapd::http::{build_router, AppState};
use roadmapd::store::GithubStore;
use roadmapd::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = AppState {
        store: Arc::new(GithubStore::new(&config)),
        tasks_path: config.tasks_path.clone(),
        state_path: config.state_path.clone(),
    };
    let router = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        repo = %format!("{}/{}", config.repo_owner, config.repo_name),
        "roadmapd listening"
    );
    axum::serve(listener, router).await.context("server exited")?;
    Ok(())
}
