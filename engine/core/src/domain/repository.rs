// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persistence Interfaces
//!
//! Contracts the engine consumes from its hosting environment:
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|-----------------|
//! | `StateStore` | registry, endpoints and agent state checkpoints | `InMemoryStateStore`, `SledStateStore` |
//! | `ArtifactStore` | generated binary artifacts | `InMemoryArtifactStore`, `LocalArtifactStore` |
//!
//! Concrete implementations are selected at startup from the `storage`
//! section of the engine configuration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentLearningState;
use crate::domain::inference::ArtifactKind;
use crate::domain::model::ModelDescriptor;
use crate::domain::provider::ProviderEndpoint;

/// Everything that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub models: Vec<ModelDescriptor>,
    pub endpoints: Vec<ProviderEndpoint>,
    pub agents: Vec<AgentLearningState>,
    pub taken_at: Option<DateTime<Utc>>,
}

/// Durable checkpoint storage
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Replace the stored snapshot atomically
    async fn persist(&self, snapshot: &EngineSnapshot) -> Result<(), PersistenceError>;

    /// Load the last snapshot, `None` on first start
    async fn load(&self) -> Result<Option<EngineSnapshot>, PersistenceError>;
}

/// Reference to a persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub url: String,
    pub id: String,
}

/// Storage for generated artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn persist(&self, bytes: &[u8], kind: ArtifactKind) -> Result<StoredArtifact, PersistenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<sled::Error> for PersistenceError {
    fn from(err: sled::Error) -> Self {
        PersistenceError::Storage(err.to_string())
    }
}
