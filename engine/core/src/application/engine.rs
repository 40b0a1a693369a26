// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Engine
//!
//! Composition root for the core. [`Engine::bootstrap`] builds the registry,
//! stats tracker, learning manager and dispatcher from an
//! [`EngineConfigSpec`] plus the host-provided dependencies, restoring the
//! last persisted snapshot.
//!
//! ## Startup merge order
//!
//! 1. Built-in catalog (when `include_default_catalog` is set)
//! 2. Persisted descriptors, replacing catalog entries by id
//! 3. Models declared in configuration, replacing both but keeping the
//!    persisted execution statistics
//!
//! Endpoints come from configuration; a persisted endpoint fills in an empty
//! `api_key` or `base_url` and persisted-only endpoints are kept.

use anyhow::Context;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::dispatcher::InferenceDispatcher;
use crate::application::learning::LearningStateManager;
use crate::application::registry::ModelRegistry;
use crate::application::stats::ExecutionStatsTracker;
use crate::domain::agent::{AgentId, AgentLearningState, LearningMode};
use crate::domain::backend::LocalBackend;
use crate::domain::engine_config::EngineConfigSpec;
use crate::domain::error::InferenceError;
use crate::domain::events::EventEmitter;
use crate::domain::inference::{CanonicalInputs, CanonicalResult};
use crate::domain::model::{
    DescriptorDraft, ExecutionAggregate, MemoryRequirement, ModelDescriptor, ModelId,
};
use crate::domain::provider::{ProviderEndpoint, ProviderFactory};
use crate::domain::repository::{ArtifactStore, EngineSnapshot, PersistenceError, StateStore};

/// Host-provided collaborators
pub struct EngineDependencies {
    pub state_store: Arc<dyn StateStore>,
    pub artifact_store: Arc<dyn ArtifactStore>,
    pub local_backend: Arc<dyn LocalBackend>,
    pub providers: Arc<dyn ProviderFactory>,
    pub events: Arc<dyn EventEmitter>,
}

pub struct Engine {
    registry: Arc<ModelRegistry>,
    stats: Arc<ExecutionStatsTracker>,
    learning: Arc<LearningStateManager>,
    dispatcher: Arc<InferenceDispatcher>,
    state_store: Arc<dyn StateStore>,
    /// Held across snapshot and persist so checkpoints land in order
    checkpoint_lock: tokio::sync::Mutex<()>,
}

impl Engine {
    pub async fn bootstrap(spec: &EngineConfigSpec, deps: EngineDependencies) -> anyhow::Result<Self> {
        let persisted = deps
            .state_store
            .load()
            .await
            .context("Failed to load persisted engine state")?
            .unwrap_or_default();

        if let Some(taken_at) = persisted.taken_at {
            info!(
                "Restoring engine state from checkpoint taken at {} ({} models, {} endpoints)",
                taken_at,
                persisted.models.len(),
                persisted.endpoints.len()
            );
        }

        let models = merge_models(spec, persisted.models)?;
        let endpoints = merge_endpoints(spec.resolved_endpoints(), persisted.endpoints);

        let registry = Arc::new(ModelRegistry::new(deps.events.clone()));
        registry.seed(models, endpoints);

        for descriptor in registry.list() {
            if descriptor.is_local()
                && descriptor.active
                && descriptor.memory_requirement != MemoryRequirement::High
            {
                if let Err(e) = registry.preload(&descriptor.id) {
                    debug!("Skipping startup preload: {}", e);
                }
            }
        }

        let stats = Arc::new(ExecutionStatsTracker::new(registry.clone(), spec.stats.history_capacity));
        let learning = Arc::new(LearningStateManager::new(
            spec.learning.progress_rate,
            spec.learning.default_mode,
            deps.events.clone(),
        ));
        learning.restore(persisted.agents);

        let dispatcher = Arc::new(InferenceDispatcher::new(
            registry.clone(),
            stats.clone(),
            learning.clone(),
            deps.local_backend,
            deps.providers,
            deps.artifact_store,
            deps.events,
        ));

        let available = registry.list().iter().filter(|d| registry.is_available(&d.id)).count();
        info!(
            "Engine ready: {} models registered ({} available, {} loaded)",
            registry.list().len(),
            available,
            registry.loaded_models().len()
        );

        Ok(Self {
            registry,
            stats,
            learning,
            dispatcher,
            state_store: deps.state_store,
            checkpoint_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Register (or re-register) a model and persist the registry.
    ///
    /// The registry change is committed before the checkpoint runs. A
    /// `PersistenceFailure` therefore means the model is live in memory but
    /// not yet durable; the next successful checkpoint persists it.
    pub async fn register_model(
        &self,
        id: &ModelId,
        draft: DescriptorDraft,
    ) -> Result<ModelDescriptor, InferenceError> {
        let descriptor = self.registry.register_model(id, draft)?;
        self.checkpoint().await?;
        Ok(descriptor)
    }

    pub async fn deregister_model(&self, id: &ModelId) -> Result<bool, InferenceError> {
        let removed = self.registry.deregister(id);
        if removed {
            self.checkpoint().await?;
        }
        Ok(removed)
    }

    /// Insert or replace an endpoint; committed in memory before persisting
    pub async fn update_endpoint(&self, endpoint: ProviderEndpoint) -> Result<(), InferenceError> {
        self.registry.upsert_endpoint(endpoint);
        self.checkpoint().await?;
        Ok(())
    }

    pub async fn run_inference(
        &self,
        model_id: &ModelId,
        inputs: CanonicalInputs,
    ) -> Result<CanonicalResult, InferenceError> {
        self.dispatcher.run_inference(model_id, inputs).await
    }

    pub async fn run_inference_with_cancel(
        &self,
        model_id: &ModelId,
        inputs: CanonicalInputs,
        cancel: &CancellationToken,
    ) -> Result<CanonicalResult, InferenceError> {
        self.dispatcher
            .run_inference_with_cancel(model_id, inputs, cancel)
            .await
    }

    pub fn get_agent_state(&self, agent: AgentId) -> AgentLearningState {
        self.learning.get_agent_state(agent)
    }

    /// Change an agent's learning mode and persist it.
    ///
    /// As with [`Engine::register_model`], a `PersistenceFailure` leaves the
    /// new mode applied in memory until the next successful checkpoint.
    pub async fn set_learning_mode(
        &self,
        agent: AgentId,
        mode: LearningMode,
    ) -> Result<AgentLearningState, InferenceError> {
        let state = self.learning.set_learning_mode(agent, mode);
        self.checkpoint().await?;
        Ok(state)
    }

    pub fn get_execution_stats(&self, model_id: &ModelId) -> Option<ExecutionAggregate> {
        self.stats.get_execution_stats(model_id)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            models: self.registry.list(),
            endpoints: self.registry.endpoints(),
            agents: self.learning.snapshot(),
            taken_at: Some(Utc::now()),
        }
    }

    pub async fn checkpoint(&self) -> Result<(), PersistenceError> {
        let _guard = self.checkpoint_lock.lock().await;
        let snapshot = self.snapshot();
        self.state_store.persist(&snapshot).await?;
        debug!("Checkpoint written ({} models)", snapshot.models.len());
        Ok(())
    }

    /// Checkpoint every `interval` until `shutdown` fires, then once more
    pub fn spawn_checkpoint_loop(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = engine.checkpoint().await {
                            error!("Periodic checkpoint failed: {}", e);
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            match engine.checkpoint().await {
                Ok(()) => info!("Final checkpoint written"),
                Err(e) => error!("Final checkpoint failed: {}", e),
            }
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<ExecutionStatsTracker> {
        &self.stats
    }

    pub fn learning(&self) -> &Arc<LearningStateManager> {
        &self.learning
    }

    pub fn dispatcher(&self) -> &Arc<InferenceDispatcher> {
        &self.dispatcher
    }
}

fn merge_models(
    spec: &EngineConfigSpec,
    persisted: Vec<ModelDescriptor>,
) -> anyhow::Result<Vec<ModelDescriptor>> {
    let mut models: BTreeMap<ModelId, ModelDescriptor> = BTreeMap::new();

    if spec.include_default_catalog {
        for descriptor in spec.default_catalog() {
            models.insert(descriptor.id.clone(), descriptor);
        }
    }

    for descriptor in persisted {
        models.insert(descriptor.id.clone(), descriptor);
    }

    for entry in &spec.models {
        let id = ModelId::new(entry.id.clone());
        let mut descriptor = entry
            .descriptor
            .clone()
            .into_descriptor(&id)
            .with_context(|| format!("Invalid model '{}' in configuration", entry.id))?;
        if let Some(previous) = models.get(&id) {
            descriptor.statistics = previous.statistics.clone();
        }
        models.insert(id, descriptor);
    }

    Ok(models.into_values().collect())
}

fn merge_endpoints(
    configured: Vec<ProviderEndpoint>,
    persisted: Vec<ProviderEndpoint>,
) -> Vec<ProviderEndpoint> {
    let mut endpoints: BTreeMap<String, ProviderEndpoint> =
        configured.into_iter().map(|e| (e.name.clone(), e)).collect();

    for stored in persisted {
        match endpoints.get_mut(&stored.name) {
            Some(current) => {
                if current.api_key.trim().is_empty() {
                    current.api_key = stored.api_key;
                }
                if current.base_url.trim().is_empty() {
                    current.base_url = stored.base_url;
                }
            }
            None => {
                endpoints.insert(stored.name.clone(), stored);
            }
        }
    }

    endpoints.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine_config::ModelConfigEntry;
    use crate::domain::model::ModelType;
    use crate::domain::provider::ProviderKind;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::local_backend::SimulatedBackend;
    use crate::infrastructure::providers::ProviderRegistry;
    use crate::infrastructure::storage::{InMemoryArtifactStore, InMemoryStateStore};

    /// Delays the first persist, or fails every persist when `failing`
    struct SlowStateStore {
        inner: InMemoryStateStore,
        first_delay: std::time::Duration,
        calls: std::sync::atomic::AtomicUsize,
        failing: bool,
    }

    impl SlowStateStore {
        fn new(first_delay: std::time::Duration, failing: bool) -> Self {
            Self {
                inner: InMemoryStateStore::new(),
                first_delay,
                calls: std::sync::atomic::AtomicUsize::new(0),
                failing,
            }
        }
    }

    #[async_trait::async_trait]
    impl StateStore for SlowStateStore {
        async fn persist(&self, snapshot: &EngineSnapshot) -> Result<(), PersistenceError> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.failing {
                return Err(PersistenceError::Storage("disk full".into()));
            }
            if call == 0 {
                tokio::time::sleep(self.first_delay).await;
            }
            self.inner.persist(snapshot).await
        }

        async fn load(&self) -> Result<Option<EngineSnapshot>, PersistenceError> {
            self.inner.load().await
        }
    }

    fn deps_with(state_store: Arc<dyn StateStore>) -> EngineDependencies {
        EngineDependencies {
            state_store,
            artifact_store: Arc::new(InMemoryArtifactStore::new()),
            local_backend: Arc::new(SimulatedBackend::new()),
            providers: Arc::new(ProviderRegistry::new()),
            events: Arc::new(EventBus::new(64)),
        }
    }

    fn curator_draft() -> DescriptorDraft {
        DescriptorDraft {
            name: Some("Curator".into()),
            model_type: Some(ModelType::Curation),
            path: Some("/models/curator".into()),
            ..Default::default()
        }
    }

    fn deps(state_store: Arc<InMemoryStateStore>) -> EngineDependencies {
        EngineDependencies {
            state_store,
            artifact_store: Arc::new(InMemoryArtifactStore::new()),
            local_backend: Arc::new(SimulatedBackend::new()),
            providers: Arc::new(ProviderRegistry::new()),
            events: Arc::new(EventBus::new(64)),
        }
    }

    fn endpoint(name: &str, key: &str) -> ProviderEndpoint {
        ProviderEndpoint {
            name: name.into(),
            provider: ProviderKind::OpenAI,
            base_url: "https://api.openai.com/v1".into(),
            api_key: key.into(),
            timeout_seconds: 60,
        }
    }

    #[test]
    fn test_persisted_key_fills_empty_config_key() {
        let merged = merge_endpoints(
            vec![endpoint("openai", ""), endpoint("configured", "sk-config")],
            vec![endpoint("openai", "sk-stored"), endpoint("configured", "sk-old"), endpoint("extra", "")],
        );

        let by_name: BTreeMap<_, _> = merged.iter().map(|e| (e.name.as_str(), e)).collect();
        assert_eq!(by_name["openai"].api_key, "sk-stored");
        assert_eq!(by_name["configured"].api_key, "sk-config");
        assert!(by_name.contains_key("extra"));
    }

    #[test]
    fn test_config_models_keep_persisted_statistics() {
        let mut persisted = ModelDescriptor::local("custom", "Old", ModelType::Text2Img, "/old");
        persisted.statistics.execution_count = 12;

        let spec = EngineConfigSpec {
            include_default_catalog: false,
            models: vec![ModelConfigEntry {
                id: "custom".into(),
                descriptor: DescriptorDraft {
                    name: Some("New".into()),
                    model_type: Some(ModelType::Text2Img),
                    path: Some("/new".into()),
                    ..Default::default()
                },
            }],
            ..Default::default()
        };

        let merged = merge_models(&spec, vec![persisted]).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "New");
        assert_eq!(merged[0].statistics.execution_count, 12);
    }

    #[tokio::test]
    async fn test_bootstrap_restores_checkpoint() {
        let store = Arc::new(InMemoryStateStore::new());
        let spec = EngineConfigSpec {
            include_default_catalog: false,
            providers: vec![],
            ..Default::default()
        };

        let engine = Engine::bootstrap(&spec, deps(store.clone())).await.unwrap();
        let id = ModelId::from("cloe_curator");
        engine
            .register_model(
                &id,
                DescriptorDraft {
                    name: Some("Curator".into()),
                    model_type: Some(ModelType::Curation),
                    path: Some("/models/curator".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        engine
            .set_learning_mode(AgentId::Cloe, LearningMode::Passive)
            .await
            .unwrap();

        let restarted = Engine::bootstrap(&spec, deps(store)).await.unwrap();

        assert!(restarted.registry().get(&id).is_some());
        assert_eq!(restarted.get_agent_state(AgentId::Cloe).learning_mode, LearningMode::Passive);
    }

    #[tokio::test]
    async fn test_default_catalog_is_registered() {
        let spec = EngineConfigSpec::default();
        let engine = Engine::bootstrap(&spec, deps(Arc::new(InMemoryStateStore::new())))
            .await
            .unwrap();

        for id in ["huraii_sd", "huraii_seed_analyzer", "huraii_sdxl_stability", "huraii_dalle"] {
            assert!(engine.registry().get(&ModelId::from(id)).is_some(), "missing {}", id);
        }
    }

    #[tokio::test]
    async fn test_slow_checkpoint_does_not_overwrite_newer_state() {
        let store = Arc::new(SlowStateStore::new(Duration::from_millis(300), false));
        let spec = EngineConfigSpec {
            include_default_catalog: false,
            providers: vec![],
            ..Default::default()
        };
        let engine = Arc::new(Engine::bootstrap(&spec, deps_with(store.clone())).await.unwrap());

        let periodic = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.checkpoint().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let id = ModelId::from("late");
        engine.register_model(&id, curator_draft()).await.unwrap();
        periodic.await.unwrap().unwrap();

        let persisted = store.load().await.unwrap().unwrap();
        assert!(persisted.models.iter().any(|m| m.id == id));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_committed_registration() {
        let store = Arc::new(SlowStateStore::new(Duration::ZERO, true));
        let spec = EngineConfigSpec {
            include_default_catalog: false,
            providers: vec![],
            ..Default::default()
        };
        let engine = Engine::bootstrap(&spec, deps_with(store)).await.unwrap();
        let id = ModelId::from("cloe_curator");

        let err = engine.register_model(&id, curator_draft()).await.unwrap_err();

        assert!(matches!(err, InferenceError::PersistenceFailure(_)));
        assert!(engine.registry().get(&id).is_some());
    }
}
