// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Engine HTTP server
//!
//! Wires the engine from an [`EngineConfigManifest`], serves the HTTP API,
//! runs the periodic checkpoint loop and writes a final checkpoint on
//! shutdown.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vortex_core::{
    application::engine::{Engine, EngineDependencies},
    domain::{engine_config::EngineConfigManifest, repository::StateStore},
    infrastructure::{
        event_bus::EventBus,
        local_backend::SimulatedBackend,
        providers::ProviderRegistry,
        storage::{InMemoryStateStore, LocalArtifactStore, SledStateStore},
    },
    presentation::api,
};

#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Overrides `spec.api.bind_address`
    pub host: Option<String>,
    /// Overrides `spec.api.port`
    pub port: Option<u16>,
    /// Keep all state in memory regardless of `spec.storage.state_path`
    pub ephemeral: bool,
}

/// Build the engine and its collaborators from configuration.
pub async fn build_engine(config: &EngineConfigManifest, ephemeral: bool) -> Result<Arc<Engine>> {
    let spec = &config.spec;

    let state_store: Arc<dyn StateStore> = match (&spec.storage.state_path, ephemeral) {
        (Some(path), false) => {
            info!("Opening state store at {}", path);
            Arc::new(
                SledStateStore::open(path)
                    .with_context(|| format!("Failed to open state store at {}", path))?,
            )
        }
        _ => {
            info!("Using in-memory state store; registry changes are lost on exit");
            Arc::new(InMemoryStateStore::new())
        }
    };

    let artifact_store = Arc::new(LocalArtifactStore::new(
        &spec.storage.artifact_dir,
        spec.storage.artifact_base_url.clone(),
    ));

    let deps = EngineDependencies {
        state_store,
        artifact_store,
        local_backend: Arc::new(SimulatedBackend::new()),
        providers: Arc::new(ProviderRegistry::new()),
        events: Arc::new(EventBus::with_default_capacity()),
    };

    let engine = Engine::bootstrap(spec, deps)
        .await
        .context("Failed to bootstrap engine")?;
    Ok(Arc::new(engine))
}

/// Run the server until Ctrl+C or SIGTERM.
pub async fn run(config: EngineConfigManifest, options: ServeOptions) -> Result<()> {
    config.validate().context("Configuration validation failed")?;
    info!("Configuration loaded: {}", config.metadata.name);

    if let Some(port) = config.spec.observability.as_ref().and_then(|o| o.metrics_port) {
        install_metrics_exporter(port)?;
    }

    let engine = build_engine(&config, options.ephemeral).await?;

    let shutdown = CancellationToken::new();
    let checkpoints = engine.spawn_checkpoint_loop(
        Duration::from_secs(config.spec.checkpoint_interval_seconds.max(1)),
        shutdown.clone(),
    );

    let host = options.host.unwrap_or_else(|| config.spec.api.bind_address.clone());
    let port = options.port.unwrap_or(config.spec.api.port);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("VORTEX engine listening on {}", addr);

    let served = axum::serve(listener, api::app(engine.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    info!("Shutting down; writing final checkpoint");
    shutdown.cancel();
    if let Err(e) = checkpoints.await {
        warn!("Checkpoint task ended abnormally: {}", e);
    }

    served
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_core::domain::inference::CanonicalInputs;
    use vortex_core::domain::model::ModelId;

    fn config_in(dir: &std::path::Path) -> EngineConfigManifest {
        let mut config = EngineConfigManifest::default();
        config.spec.models_dir = dir.join("models").to_string_lossy().into_owned();
        config.spec.storage.state_path = Some(dir.join("state").to_string_lossy().into_owned());
        config.spec.storage.artifact_dir = dir.join("artifacts").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn test_build_engine_persists_to_sled() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(dir.path().join("models").join("huraii-sd")).unwrap();

        {
            let engine = build_engine(&config, false).await.unwrap();
            engine
                .run_inference(&ModelId::from("huraii_sd"), CanonicalInputs::new().with("prompt", "x"))
                .await
                .unwrap();
            engine.checkpoint().await.unwrap();
        }

        let engine = build_engine(&config, false).await.unwrap();
        let stats = engine.get_execution_stats(&ModelId::from("huraii_sd")).unwrap();
        assert_eq!(stats.execution_count, 1);
        assert!(dir.path().join("artifacts").exists());
    }

    #[tokio::test]
    async fn test_ephemeral_ignores_state_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let engine = build_engine(&config, true).await.unwrap();
        engine.checkpoint().await.unwrap();

        assert!(!dir.path().join("state").exists());
    }
}
