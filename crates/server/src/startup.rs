use axum::Router;
use common::env::ensure_data_dir;
use configs::AppConfig;
use service::squirrels::FileSquirrelStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, SharedStore};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the store once; it is shared by every request for the life of the process.
/// A corrupt backing file stops startup here.
pub async fn open_store(cfg: &AppConfig) -> Result<SharedStore, StartupError> {
    ensure_data_dir(&cfg.storage.data_file).await?;
    let store: SharedStore = FileSquirrelStore::open(&cfg.storage.data_file).await?;
    Ok(store)
}

/// Build the router over an already opened store.
pub fn build_app(store: SharedStore) -> Router {
    routes::build_router(store, build_cors())
}

/// Serve with an explicit configuration.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let store = open_store(&cfg).await?;
    let app = build_app(store);

    let listener = TcpListener::bind(cfg.server.bind_addr()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, data_file = %cfg.storage.data_file, "starting squirrel server");
    axum::serve(listener, app).await?;
    Ok(())
}
