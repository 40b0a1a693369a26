// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::inference::ArtifactKind;
use crate::domain::repository::{
    ArtifactStore, EngineSnapshot, PersistenceError, StateStore, StoredArtifact,
};

#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    snapshot: Arc<RwLock<Option<EngineSnapshot>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn persist(&self, snapshot: &EngineSnapshot) -> Result<(), PersistenceError> {
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<EngineSnapshot>, PersistenceError> {
        Ok(self.snapshot.read().clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryArtifactStore {
    artifacts: Arc<RwLock<HashMap<String, (ArtifactKind, Vec<u8>)>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<(ArtifactKind, Vec<u8>)> {
        self.artifacts.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn persist(&self, bytes: &[u8], kind: ArtifactKind) -> Result<StoredArtifact, PersistenceError> {
        let id = Uuid::new_v4().simple().to_string();
        let url = format!("memory://artifacts/{}.{}", id, kind.extension());
        self.artifacts.write().insert(id.clone(), (kind, bytes.to_vec()));
        Ok(StoredArtifact { url, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_store_round_trip() {
        let store = InMemoryStateStore::new();
        assert!(store.load().await.unwrap().is_none());

        let snapshot = EngineSnapshot::default();
        store.persist(&snapshot).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_artifact_ids_are_unique() {
        let store = InMemoryArtifactStore::new();
        let a = store.persist(b"one", ArtifactKind::Png).await.unwrap();
        let b = store.persist(b"two", ArtifactKind::Svg).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(b.url.ends_with(".svg"));
        assert_eq!(store.get(&a.id).unwrap().1, b"one");
        assert_eq!(store.len(), 2);
    }
}
