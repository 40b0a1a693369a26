// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use vortex_core::application::engine::{Engine, EngineDependencies};
use vortex_core::domain::engine_config::{EngineConfigSpec, ProviderEndpointConfig};
use vortex_core::domain::model::{DescriptorDraft, ModelId, ModelType};
use vortex_core::domain::provider::ProviderKind;
use vortex_core::infrastructure::event_bus::EventBus;
use vortex_core::infrastructure::local_backend::SimulatedBackend;
use vortex_core::infrastructure::providers::ProviderRegistry;
use vortex_core::infrastructure::storage::{InMemoryArtifactStore, InMemoryStateStore};

pub struct TestEngine {
    pub engine: Arc<Engine>,
    pub events: Arc<EventBus>,
    pub artifacts: Arc<InMemoryArtifactStore>,
    /// Existing directory usable as a local model path
    pub models_dir: TempDir,
}

pub fn endpoint(name: &str, provider: ProviderKind, base_url: &str, api_key: &str) -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        name: name.to_string(),
        provider_type: provider,
        base_url: base_url.to_string(),
        api_key: Some(api_key.to_string()),
        timeout_seconds: 5,
    }
}

pub async fn engine_with(providers: Vec<ProviderEndpointConfig>) -> TestEngine {
    let spec = EngineConfigSpec {
        include_default_catalog: false,
        providers,
        ..Default::default()
    };

    let events = Arc::new(EventBus::new(256));
    let artifacts = Arc::new(InMemoryArtifactStore::new());
    let deps = EngineDependencies {
        state_store: Arc::new(InMemoryStateStore::new()),
        artifact_store: artifacts.clone(),
        local_backend: Arc::new(SimulatedBackend::new()),
        providers: Arc::new(ProviderRegistry::new()),
        events: events.clone(),
    };

    let engine = Engine::bootstrap(&spec, deps).await.expect("engine bootstrap");
    TestEngine {
        engine: Arc::new(engine),
        events,
        artifacts,
        models_dir: tempfile::tempdir().expect("tempdir"),
    }
}

impl TestEngine {
    pub async fn register_local(&self, id: &str, model_type: ModelType) -> ModelId {
        let model_id = ModelId::from(id);
        self.engine
            .register_model(
                &model_id,
                DescriptorDraft {
                    name: Some(id.to_string()),
                    model_type: Some(model_type),
                    path: Some(self.models_dir.path().to_string_lossy().into_owned()),
                    ..Default::default()
                },
            )
            .await
            .expect("register local model");
        model_id
    }

    pub async fn register_remote(&self, id: &str, endpoint: &str, remote_model: &str) -> ModelId {
        let model_id = ModelId::from(id);
        self.engine
            .register_model(
                &model_id,
                DescriptorDraft {
                    name: Some(id.to_string()),
                    model_type: Some(ModelType::Text2Img),
                    api_endpoint: Some(endpoint.to_string()),
                    remote_model: Some(remote_model.to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("register remote model");
        model_id
    }
}
