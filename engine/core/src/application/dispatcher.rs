// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inference Dispatcher
//!
//! Single entry point for running a registered model.
//!
//! ```text
//! run_inference(model_id, inputs)
//!   ├─ is_available?          ── no ──▶ ModelUnavailable
//!   ├─ preload (local only)   ── err ─▶ ModelLoadFailed
//!   ├─ attribute_agent ─▶ notify(pre_execution)
//!   ├─ api_endpoint set? ─▶ ImageProvider::generate
//!   │                else ─▶ LocalBackend::generate_local
//!   ├─ ArtifactStore::persist
//!   └─ stats.record ─▶ notify(execution_complete | execution_failed) ─▶ emit
//! ```
//!
//! No lock is held across the backend call; every registry read returns an
//! owned snapshot of the descriptor.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::application::learning::LearningStateManager;
use crate::application::registry::ModelRegistry;
use crate::application::stats::ExecutionStatsTracker;
use crate::domain::agent::{attribute_agent, AgentId, LearningTransition};
use crate::domain::backend::LocalBackend;
use crate::domain::error::InferenceError;
use crate::domain::events::{EngineEvent, EventEmitter, InferenceEvent};
use crate::domain::execution::ExecutionRecord;
use crate::domain::inference::{CanonicalInputs, CanonicalResult, GeneratedArtifact, UNKNOWN_SEED};
use crate::domain::model::{ModelDescriptor, ModelId};
use crate::domain::provider::ProviderFactory;
use crate::domain::repository::ArtifactStore;

pub struct InferenceDispatcher {
    registry: Arc<ModelRegistry>,
    stats: Arc<ExecutionStatsTracker>,
    learning: Arc<LearningStateManager>,
    local_backend: Arc<dyn LocalBackend>,
    providers: Arc<dyn ProviderFactory>,
    artifacts: Arc<dyn ArtifactStore>,
    events: Arc<dyn EventEmitter>,
}

impl InferenceDispatcher {
    pub fn new(
        registry: Arc<ModelRegistry>,
        stats: Arc<ExecutionStatsTracker>,
        learning: Arc<LearningStateManager>,
        local_backend: Arc<dyn LocalBackend>,
        providers: Arc<dyn ProviderFactory>,
        artifacts: Arc<dyn ArtifactStore>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            registry,
            stats,
            learning,
            local_backend,
            providers,
            artifacts,
            events,
        }
    }

    pub async fn run_inference(
        &self,
        model_id: &ModelId,
        inputs: CanonicalInputs,
    ) -> Result<CanonicalResult, InferenceError> {
        self.run_inference_with_cancel(model_id, inputs, &CancellationToken::new())
            .await
    }

    /// Like [`run_inference`](Self::run_inference), but returns
    /// `InferenceError::Cancelled` if `cancel` fires before the backend call
    /// starts. A call already in flight runs to completion.
    #[instrument(skip(self, inputs, cancel), fields(model_id = %model_id))]
    pub async fn run_inference_with_cancel(
        &self,
        model_id: &ModelId,
        inputs: CanonicalInputs,
        cancel: &CancellationToken,
    ) -> Result<CanonicalResult, InferenceError> {
        let started = Instant::now();

        if !self.registry.is_available(model_id) {
            return Err(InferenceError::ModelUnavailable(model_id.clone()));
        }
        let descriptor = self
            .registry
            .get(model_id)
            .ok_or_else(|| InferenceError::ModelUnavailable(model_id.clone()))?;

        if descriptor.is_local() && !self.registry.is_loaded(model_id) {
            match self.registry.preload(model_id) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(InferenceError::ModelLoadFailed(format!(
                        "{}: model became inactive during load",
                        model_id
                    )))
                }
                Err(e @ InferenceError::ModelLoadFailed(_)) => return Err(e),
                Err(e) => return Err(InferenceError::ModelLoadFailed(e.to_string())),
            }
        }

        if cancel.is_cancelled() {
            info!("Inference on '{}' cancelled before dispatch", model_id);
            return Err(InferenceError::Cancelled);
        }

        let agent = attribute_agent(model_id, descriptor.model_type);
        let input_size = inputs.estimated_size();
        if let Some(agent) = agent {
            self.learning.notify(
                agent,
                LearningTransition::PreExecution {
                    model_id: model_id.clone(),
                    input_size,
                },
            );
        }

        let outcome = match self.dispatch(&descriptor, &inputs).await {
            Ok(artifact) => self.finalize(&descriptor, artifact, started).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                self.on_success(&descriptor, agent, &result, input_size);
                Ok(result)
            }
            Err(e) => {
                self.on_failure(&descriptor, agent, &e, started, input_size);
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        if descriptor.is_remote() {
            let endpoint = self
                .registry
                .endpoint(&descriptor.api_endpoint)
                .filter(|e| e.is_active())
                .ok_or_else(|| InferenceError::ProviderInactive(descriptor.api_endpoint.clone()))?;

            let adapter = self.providers.adapter(&endpoint);
            adapter.generate(descriptor, inputs).await
        } else {
            self.local_backend.generate_local(descriptor, inputs).await
        }
    }

    async fn finalize(
        &self,
        descriptor: &ModelDescriptor,
        artifact: GeneratedArtifact,
        started: Instant,
    ) -> Result<CanonicalResult, InferenceError> {
        let stored = self.artifacts.persist(&artifact.bytes, artifact.kind).await?;

        Ok(CanonicalResult {
            model_id: descriptor.id.clone(),
            image_url: stored.url,
            image_id: stored.id,
            image_data: STANDARD.encode(&artifact.bytes),
            seed: artifact.seed.unwrap_or(UNKNOWN_SEED),
            analysis: artifact.analysis,
            duration_seconds: started.elapsed().as_secs_f64(),
        })
    }

    fn on_success(
        &self,
        descriptor: &ModelDescriptor,
        agent: Option<AgentId>,
        result: &CanonicalResult,
        input_size: u64,
    ) {
        let output_size = result.estimated_size();

        self.stats.record(ExecutionRecord::success(
            descriptor.id.clone(),
            result.duration_seconds,
            output_size,
            input_size + output_size,
        ));

        if let Some(agent) = agent {
            self.learning.notify(
                agent,
                LearningTransition::ExecutionComplete {
                    model_id: descriptor.id.clone(),
                    duration_seconds: result.duration_seconds,
                    output_size,
                },
            );
        }

        self.events.emit(EngineEvent::Inference(InferenceEvent::ModelExecutionComplete {
            model_id: descriptor.id.clone(),
            agent_id: agent,
            duration_seconds: result.duration_seconds,
            result_size_bytes: output_size,
            image_id: result.image_id.clone(),
            completed_at: Utc::now(),
        }));

        info!(
            "Inference on '{}' completed in {:.3}s ({} bytes)",
            descriptor.id, result.duration_seconds, output_size
        );
    }

    fn on_failure(
        &self,
        descriptor: &ModelDescriptor,
        agent: Option<AgentId>,
        error: &InferenceError,
        started: Instant,
        input_size: u64,
    ) {
        let duration = started.elapsed().as_secs_f64();

        self.stats.record(ExecutionRecord::failure(descriptor.id.clone(), duration, input_size));

        if let Some(agent) = agent {
            self.learning.notify(
                agent,
                LearningTransition::ExecutionFailed {
                    model_id: descriptor.id.clone(),
                    error_kind: error.kind().to_string(),
                },
            );
        }

        self.events.emit(EngineEvent::Inference(InferenceEvent::ModelExecutionFailed {
            model_id: descriptor.id.clone(),
            agent_id: agent,
            error_kind: error.kind().to_string(),
            message: error.to_string(),
            failed_at: Utc::now(),
        }));

        warn!("Inference on '{}' failed after {:.3}s: {}", descriptor.id, duration, error);
    }
}
