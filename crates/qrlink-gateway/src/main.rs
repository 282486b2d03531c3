mod cli;
mod telemetry;

use crate::cli::{Cli, StorageBackendArg};
use clap::Parser;
use qrlink_catalog::{CatalogConfig, RecordStore};
use qrlink_core::BlobStore;
use qrlink_gateway::{App, AppState};
use qrlink_redirector::{RedirectorService, VisitRecording};
use qrlink_storage::{InMemoryBlobStore, RedisBlobStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::try_parse()?;
    telemetry::init(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        code_length = config.code_length,
        visit_recording = ?config.visit_recording,
        "starting qrlink gateway"
    );

    let catalog = CatalogConfig {
        code_length: usize::from(config.code_length),
        ip_hash_salt: config.ip_hash_salt.clone(),
        ..CatalogConfig::default()
    };
    let recording = VisitRecording::from(config.visit_recording);

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(config.listen_addr, InMemoryBlobStore::new(), catalog, recording).await?;
        }
        StorageBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .ok_or("redis url is required when storage backend is redis")?;
            let store = RedisBlobStore::connect(&redis_url, config.redis_key_prefix).await?;
            run_server(config.listen_addr, store, catalog, recording).await?;
        }
    }

    Ok(())
}

async fn run_server<S: BlobStore>(
    listen_addr: SocketAddr,
    store: S,
    catalog: CatalogConfig,
    recording: VisitRecording,
) -> std::io::Result<()> {
    let records = RecordStore::new(Arc::new(store), catalog);
    let redirector = RedirectorService::with_recording(records.clone(), recording);
    let state = AppState::new(records, Arc::new(redirector));

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
