// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Model Registry
//!
//! Owns every [`ModelDescriptor`] and the provider endpoints they reference,
//! plus the per-process cache of [`LoadedModelHandle`]s.
//!
//! ## Locking
//!
//! Descriptors and loaded handles live in sharded [`DashMap`]s, so writes to
//! one model id only contend with ids hashed to the same shard. Endpoints
//! change rarely and sit behind a single `RwLock`. No lock is ever held across
//! an `.await` or a backend call.
//!
//! ## Availability
//!
//! A model is available iff it is registered, active, and either its local
//! `path` exists or its endpoint exists and is active.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::error::InferenceError;
use crate::domain::events::{EngineEvent, EventEmitter, ModelEvent};
use crate::domain::model::{
    DescriptorDraft, ExecutionAggregate, LoadedModelHandle, MemoryRequirement, ModelDescriptor,
    ModelId,
};
use crate::domain::provider::ProviderEndpoint;

pub struct ModelRegistry {
    descriptors: DashMap<ModelId, ModelDescriptor>,
    endpoints: RwLock<HashMap<String, ProviderEndpoint>>,
    loaded: DashMap<ModelId, LoadedModelHandle>,
    events: Arc<dyn EventEmitter>,
}

impl ModelRegistry {
    pub fn new(events: Arc<dyn EventEmitter>) -> Self {
        Self {
            descriptors: DashMap::new(),
            endpoints: RwLock::new(HashMap::new()),
            loaded: DashMap::new(),
            events,
        }
    }

    /// Insert descriptors and endpoints without validation or side effects.
    /// Used when restoring from configuration and checkpoints.
    pub fn seed(&self, models: Vec<ModelDescriptor>, endpoints: Vec<ProviderEndpoint>) {
        {
            let mut guard = self.endpoints.write();
            for endpoint in endpoints {
                guard.insert(endpoint.name.clone(), endpoint);
            }
        }
        for model in models {
            self.descriptors.insert(model.id.clone(), model);
        }
    }

    /// Validate, apply defaults and register a model.
    ///
    /// Re-registering an existing id replaces its configuration but keeps its
    /// execution statistics. Local, active models that do not need high memory
    /// are preloaded eagerly; a failed preload is logged, not returned.
    pub fn register_model(
        &self,
        id: &ModelId,
        draft: DescriptorDraft,
    ) -> Result<ModelDescriptor, InferenceError> {
        let mut descriptor = draft.into_descriptor(id)?;

        if let Some(existing) = self.descriptors.get(id) {
            descriptor.statistics = existing.statistics.clone();
        }
        // A stale handle would still carry the previous configuration
        self.loaded.remove(id);
        self.descriptors.insert(id.clone(), descriptor.clone());

        info!("Registered model '{}' ({}, {})", id, descriptor.model_type,
            if descriptor.is_remote() { "remote" } else { "local" });

        self.events.emit(EngineEvent::Model(ModelEvent::ModelRegistered {
            model_id: id.clone(),
            model_type: descriptor.model_type,
            remote: descriptor.is_remote(),
            registered_at: Utc::now(),
        }));

        if descriptor.is_local()
            && descriptor.active
            && descriptor.memory_requirement != MemoryRequirement::High
        {
            if let Err(e) = self.preload(id) {
                warn!("Eager preload of '{}' failed: {}", id, e);
            }
        }

        Ok(descriptor)
    }

    pub fn deregister(&self, id: &ModelId) -> bool {
        self.loaded.remove(id);
        let removed = self.descriptors.remove(id).is_some();
        if removed {
            info!("Deregistered model '{}'", id);
            self.events.emit(EngineEvent::Model(ModelEvent::ModelDeregistered {
                model_id: id.clone(),
                removed_at: Utc::now(),
            }));
        }
        removed
    }

    pub fn get(&self, id: &ModelId) -> Option<ModelDescriptor> {
        self.descriptors.get(id).map(|d| d.clone())
    }

    /// All descriptors ordered by id
    pub fn list(&self) -> Vec<ModelDescriptor> {
        let mut models: Vec<_> = self.descriptors.iter().map(|d| d.value().clone()).collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }

    pub fn is_available(&self, id: &ModelId) -> bool {
        let Some(descriptor) = self.get(id) else {
            return false;
        };
        if !descriptor.active {
            return false;
        }

        if descriptor.is_remote() {
            self.endpoints
                .read()
                .get(&descriptor.api_endpoint)
                .map(ProviderEndpoint::is_active)
                .unwrap_or(false)
        } else {
            Path::new(&descriptor.path).exists()
        }
    }

    /// Load a local model into the in-process cache.
    ///
    /// Returns `Ok(true)` when the model is (or already was) loaded and
    /// `Ok(false)` for remote or inactive models, which have no load step.
    pub fn preload(&self, id: &ModelId) -> Result<bool, InferenceError> {
        if self.loaded.contains_key(id) {
            return Ok(true);
        }

        let descriptor = self
            .get(id)
            .ok_or_else(|| InferenceError::ModelUnavailable(id.clone()))?;

        if descriptor.is_remote() || !descriptor.active {
            debug!("Skipping preload of '{}' (remote or inactive)", id);
            return Ok(false);
        }

        if !Path::new(&descriptor.path).exists() {
            return Err(InferenceError::ModelLoadFailed(format!(
                "{}: resource not found at {}",
                id, descriptor.path
            )));
        }

        let mut created = false;
        self.loaded.entry(id.clone()).or_insert_with(|| {
            created = true;
            LoadedModelHandle::new(descriptor)
        });

        if created {
            info!("Loaded model '{}'", id);
            self.events.emit(EngineEvent::Model(ModelEvent::ModelLoaded {
                model_id: id.clone(),
                loaded_at: Utc::now(),
            }));
        }

        Ok(true)
    }

    /// Drop a loaded handle. Always succeeds.
    pub fn unload(&self, id: &ModelId) -> bool {
        if self.loaded.remove(id).is_some() {
            info!("Unloaded model '{}'", id);
            self.events.emit(EngineEvent::Model(ModelEvent::ModelUnloaded {
                model_id: id.clone(),
                unloaded_at: Utc::now(),
            }));
        }
        true
    }

    pub fn is_loaded(&self, id: &ModelId) -> bool {
        self.loaded.contains_key(id)
    }

    pub fn loaded_models(&self) -> Vec<LoadedModelHandle> {
        self.loaded.iter().map(|h| h.value().clone()).collect()
    }

    /// Fold one execution into the model's aggregate. Returns false if the
    /// model was deregistered in the meantime.
    pub fn record_execution(&self, id: &ModelId, duration_seconds: f64, success: bool) -> bool {
        match self.descriptors.get_mut(id) {
            Some(mut descriptor) => {
                descriptor.statistics.record(duration_seconds, success, Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn statistics(&self, id: &ModelId) -> Option<ExecutionAggregate> {
        self.descriptors.get(id).map(|d| d.statistics.clone())
    }

    /// Explicit registry reset of execution aggregates; all models when `id` is `None`
    pub fn reset_statistics(&self, id: Option<&ModelId>) {
        match id {
            Some(id) => {
                if let Some(mut descriptor) = self.descriptors.get_mut(id) {
                    descriptor.statistics = ExecutionAggregate::default();
                }
            }
            None => {
                for mut descriptor in self.descriptors.iter_mut() {
                    descriptor.statistics = ExecutionAggregate::default();
                }
            }
        }
    }

    pub fn endpoint(&self, name: &str) -> Option<ProviderEndpoint> {
        self.endpoints.read().get(name).cloned()
    }

    pub fn endpoints(&self) -> Vec<ProviderEndpoint> {
        let mut endpoints: Vec<_> = self.endpoints.read().values().cloned().collect();
        endpoints.sort_by(|a, b| a.name.cmp(&b.name));
        endpoints
    }

    pub fn upsert_endpoint(&self, endpoint: ProviderEndpoint) {
        info!("Updated provider endpoint '{}' (active: {})", endpoint.name, endpoint.is_active());
        self.endpoints.write().insert(endpoint.name.clone(), endpoint);
    }
}
