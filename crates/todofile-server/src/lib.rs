//! # todofile-server
//!
//! HTTP dispatch layer for the todofile task service: a thin axum router
//! that maps verbs and paths onto task store operations, with each handler
//! applying its access-gate policy explicitly before touching the store.

mod auth;
mod server;

pub use auth::AuthGate;
pub use server::{router, AppState, SharedState};

use std::sync::Arc;
use todofile_core::ServerConfig;
use todofile_store::{FileStorage, TodoStore};
use tracing::info;

/// Build the store from the configured data directory and serve forever.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let store = TodoStore::open(storage).await;

    let state = Arc::new(AppState {
        store,
        gate: AuthGate::new(config.api_token.clone()),
        page_title: config.page_title.clone(),
        show_admin_panel: config.show_admin_panel,
    });

    let addr = config.bind_addr();
    info!("Starting todofile server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
