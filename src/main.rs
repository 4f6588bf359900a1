use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use loop_evaluator::config::Config;
use loop_evaluator::controller::{Controller, LiveVenue, Timeouts};
use loop_evaluator::exchanges::okx::OkxQuoteSource;
use loop_evaluator::routes::{self, AppState};
use loop_evaluator::store::MemoryStore;
use loop_evaluator::utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_tracing();

    let cfg = Config::from_env()?;
    let store = Arc::new(MemoryStore::load(&cfg.store_path)?);
    let quotes = Arc::new(OkxQuoteSource::new(cfg.okx_base_url.clone()));

    let controller = Controller::new(
        store.clone(),
        store.clone(),
        quotes,
        store.clone(),
        LiveVenue { platform: cfg.live_platform.clone(), method: cfg.live_method.clone() },
        Timeouts { quotes: cfg.quote_timeout, persist: cfg.persist_timeout },
    );
    let app = routes::router(AppState { controller, keys: store });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
