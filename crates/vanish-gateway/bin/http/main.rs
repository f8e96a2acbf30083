mod cli;
mod telemetry;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use vanish_core::{PasteRepository, SystemClock, TimeMode, TimeSource};
use vanish_gateway::{App, AppState};
use vanish_paste::{PasteService, RandomIdGenerator};
use vanish_storage::{InMemoryRepository, RedisConnector, RedisRepository, RedisSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.log_format);

    let time_mode = if config.deterministic_time() {
        warn!("deterministic time enabled, x-test-now-ms overrides the clock");
        TimeMode::Deterministic
    } else {
        TimeMode::Wall
    };

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        ?time_mode,
        "starting vanish gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(&config, InMemoryRepository::new(), time_mode).await?;
        }
        StorageBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .clone()
                .context("redis url is required when storage backend is redis")?;
            let settings = RedisSettings::builder()
                .url(redis_url)
                .max_retries(config.redis_max_retries)
                .connect_timeout(config.redis_connect_timeout())
                .response_timeout(config.redis_response_timeout())
                .build();
            // connects lazily on the first request
            let connector = RedisConnector::new(settings)?;
            let repository = RedisRepository::with_prefix(connector, config.redis_key_prefix.clone());
            run_server(&config, repository, time_mode).await?;
        }
    }

    Ok(())
}

async fn run_server<R: PasteRepository>(
    config: &CLI,
    repository: R,
    time_mode: TimeMode,
) -> anyhow::Result<()> {
    let service = PasteService::new(
        repository,
        RandomIdGenerator,
        TimeSource::new(SystemClock, time_mode),
    );

    let mut state = AppState::new(Arc::new(service)).with_health_timeout(config.health_timeout());
    if let Some(base_url) = &config.public_base_url {
        state = state.with_public_base_url(base_url);
    }

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
