// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Engine Domain Events
//
// Fire-and-forget notifications for cross-cutting concerns. Published through
// an EventEmitter; the core never waits on subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, AgentLearningState};
use crate::domain::model::{ModelId, ModelType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelEvent {
    ModelRegistered {
        model_id: ModelId,
        model_type: ModelType,
        remote: bool,
        registered_at: DateTime<Utc>,
    },
    ModelDeregistered {
        model_id: ModelId,
        removed_at: DateTime<Utc>,
    },
    ModelLoaded {
        model_id: ModelId,
        loaded_at: DateTime<Utc>,
    },
    ModelUnloaded {
        model_id: ModelId,
        unloaded_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InferenceEvent {
    ModelExecutionComplete {
        model_id: ModelId,
        agent_id: Option<AgentId>,
        duration_seconds: f64,
        result_size_bytes: u64,
        image_id: String,
        completed_at: DateTime<Utc>,
    },
    ModelExecutionFailed {
        model_id: ModelId,
        agent_id: Option<AgentId>,
        error_kind: String,
        message: String,
        failed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LearningEvent {
    AgentLearningStateUpdated {
        agent_id: AgentId,
        transition: String,
        state: AgentLearningState,
        updated_at: DateTime<Utc>,
    },
}

/// Unified event envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Model(ModelEvent),
    Inference(InferenceEvent),
    Learning(LearningEvent),
}

impl EngineEvent {
    /// Stable event name, analogous to a host action hook name
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Model(ModelEvent::ModelRegistered { .. }) => "model_registered",
            EngineEvent::Model(ModelEvent::ModelDeregistered { .. }) => "model_deregistered",
            EngineEvent::Model(ModelEvent::ModelLoaded { .. }) => "model_loaded",
            EngineEvent::Model(ModelEvent::ModelUnloaded { .. }) => "model_unloaded",
            EngineEvent::Inference(InferenceEvent::ModelExecutionComplete { .. }) => {
                "model_execution_complete"
            }
            EngineEvent::Inference(InferenceEvent::ModelExecutionFailed { .. }) => {
                "model_execution_failed"
            }
            EngineEvent::Learning(LearningEvent::AgentLearningStateUpdated { .. }) => {
                "agent_learning_state_updated"
            }
        }
    }
}

/// Sink for engine events, implemented by the host
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: EngineEvent);
}
