mod error;
mod extract;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mediapress_core::{Clock, Config, SystemClock};
use mediapress_pipeline::{IngestPipeline, Sweeper};
use mediapress_storage::{create_large_object_storage, create_primary_storage};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let primary = create_primary_storage(&config).await?;
    let large_object = create_large_object_storage(&config).await?;
    tracing::info!(
        primary = %primary.backend_type(),
        large_object_configured = large_object.is_some(),
        "Storage backends ready"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let pipeline = Arc::new(IngestPipeline::from_config(
        &config,
        primary,
        large_object.clone(),
        clock,
    ));

    Sweeper::new(
        pipeline.gate().clone(),
        pipeline.dedup().clone(),
        Duration::from_secs(config.sweep_interval_secs),
    )
    .spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let state = Arc::new(AppState {
        config,
        pipeline,
        large_object,
    });
    let router = routes::router(state);

    tracing::info!(%addr, "Starting mediapress ingestion service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
