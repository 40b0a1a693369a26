// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Sled-backed State Store
//
// Each snapshot section is stored as a JSON document under its own key in
// the `vortex_state` tree. A checkpoint replaces all sections in one batch,
// so readers never observe a half-written snapshot.
//
// sled holds an exclusive lock on the database directory: only one process
// may open a given `state_path` at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::repository::{EngineSnapshot, PersistenceError, StateStore};

const TREE: &str = "vortex_state";
const KEY_MODELS: &str = "models";
const KEY_ENDPOINTS: &str = "endpoints";
const KEY_AGENTS: &str = "agents";
const KEY_TAKEN_AT: &str = "taken_at";

#[derive(Clone)]
pub struct SledStateStore {
    tree: sled::Tree,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let tree = db.open_tree(TREE)?;
        info!("Opened state store at {}", path.display());
        Ok(Self { tree })
    }

    /// Throwaway store for tests; removed when dropped
    pub fn temporary() -> Result<Self, PersistenceError> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(TREE)?;
        Ok(Self { tree })
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.tree.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStore for SledStateStore {
    async fn persist(&self, snapshot: &EngineSnapshot) -> Result<(), PersistenceError> {
        let mut batch = sled::Batch::default();
        batch.insert(KEY_MODELS, serde_json::to_vec(&snapshot.models)?);
        batch.insert(KEY_ENDPOINTS, serde_json::to_vec(&snapshot.endpoints)?);
        batch.insert(KEY_AGENTS, serde_json::to_vec(&snapshot.agents)?);
        batch.insert(KEY_TAKEN_AT, serde_json::to_vec(&snapshot.taken_at)?);

        self.tree.apply_batch(batch)?;
        self.tree.flush_async().await?;
        debug!("Persisted snapshot ({} models, {} agents)", snapshot.models.len(), snapshot.agents.len());
        Ok(())
    }

    async fn load(&self) -> Result<Option<EngineSnapshot>, PersistenceError> {
        let Some(taken_at) = self.read::<Option<DateTime<Utc>>>(KEY_TAKEN_AT)? else {
            return Ok(None);
        };

        Ok(Some(EngineSnapshot {
            models: self.read(KEY_MODELS)?.unwrap_or_default(),
            endpoints: self.read(KEY_ENDPOINTS)?.unwrap_or_default(),
            agents: self.read(KEY_AGENTS)?.unwrap_or_default(),
            taken_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, AgentLearningState};
    use crate::domain::model::{ModelDescriptor, ModelType};

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let store = SledStateStore::temporary().unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = AgentLearningState::new(AgentId::Huraii);
        agent.learning_progress = 0.25;
        let snapshot = EngineSnapshot {
            models: vec![ModelDescriptor::local("huraii_sd", "SD", ModelType::Text2Img, "/m/sd")],
            endpoints: vec![],
            agents: vec![agent],
            taken_at: Some(Utc::now()),
        };

        {
            let store = SledStateStore::open(dir.path()).unwrap();
            store.persist(&snapshot).await.unwrap();
        }

        let reopened = SledStateStore::open(dir.path()).unwrap();
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }
}
