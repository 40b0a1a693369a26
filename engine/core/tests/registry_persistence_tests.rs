// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Restart behaviour with the sled-backed state store and YAML configuration.

use std::sync::Arc;

use vortex_core::application::engine::{Engine, EngineDependencies};
use vortex_core::domain::agent::{AgentId, LearningMode};
use vortex_core::domain::engine_config::EngineConfigManifest;
use vortex_core::domain::inference::CanonicalInputs;
use vortex_core::domain::model::ModelId;
use vortex_core::infrastructure::event_bus::EventBus;
use vortex_core::infrastructure::local_backend::SimulatedBackend;
use vortex_core::infrastructure::providers::ProviderRegistry;
use vortex_core::infrastructure::storage::{LocalArtifactStore, SledStateStore};

fn manifest(models_dir: &str) -> EngineConfigManifest {
    let yaml = format!(
        r#"
apiVersion: vortex.ai/v1
kind: EngineConfig
metadata:
  name: restart-test
spec:
  include_default_catalog: true
  models_dir: "{models_dir}"
  providers:
    - name: stability
      type: stability
      base_url: https://api.stability.ai
      api_key: sk-configured
    - name: huggingface
      type: huggingface
      base_url: https://api-inference.huggingface.co
    - name: openai
      type: openai
      base_url: https://api.openai.com/v1
  learning:
    progress_rate: 0.5
"#
    );
    EngineConfigManifest::from_yaml_str(&yaml).unwrap()
}

async fn boot(manifest: &EngineConfigManifest, state: &std::path::Path, artifacts: &std::path::Path) -> Engine {
    let deps = EngineDependencies {
        state_store: Arc::new(SledStateStore::open(state).unwrap()),
        artifact_store: Arc::new(LocalArtifactStore::new(artifacts, None)),
        local_backend: Arc::new(SimulatedBackend::new()),
        providers: Arc::new(ProviderRegistry::new()),
        events: Arc::new(EventBus::default()),
    };
    Engine::bootstrap(&manifest.spec, deps).await.unwrap()
}

#[tokio::test]
async fn test_state_survives_restart() {
    let root = tempfile::tempdir().unwrap();
    let models_dir = root.path().join("models");
    std::fs::create_dir_all(models_dir.join("huraii-sd")).unwrap();
    let manifest = manifest(&models_dir.to_string_lossy());
    manifest.validate().unwrap();

    let state_path = root.path().join("state");
    let artifact_dir = root.path().join("artifacts");
    let id = ModelId::from("huraii_sd");

    {
        let engine = boot(&manifest, &state_path, &artifact_dir).await;
        assert!(engine.registry().is_available(&id));
        assert!(engine.registry().is_available(&ModelId::from("huraii_sdxl_stability")));

        let result = engine
            .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
            .await
            .unwrap();
        assert!(result.image_url.starts_with("file://"));

        engine.set_learning_mode(AgentId::Huraii, LearningMode::Passive).await.unwrap();
        engine.checkpoint().await.unwrap();
    }

    let engine = boot(&manifest, &state_path, &artifact_dir).await;

    assert_eq!(engine.get_execution_stats(&id).unwrap().execution_count, 1);
    let agent = engine.get_agent_state(AgentId::Huraii);
    assert_eq!(agent.model_execution_count, 1);
    assert!((agent.learning_progress - 0.5).abs() < 1e-9);
    assert_eq!(agent.learning_mode, LearningMode::Passive);

    // Loaded handles are never persisted; the catalog entry is preloaded again
    assert!(engine.registry().is_loaded(&id));
    // High-memory inpainting is registered but not eagerly loaded
    assert!(!engine.registry().is_loaded(&ModelId::from("huraii_inpainting")));
}
