// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Local Artifact Store
//
// Writes each artifact to `{dir}/{id}.{ext}`. The returned URL is
// `{base_url}/{id}.{ext}` when a public base URL is configured, otherwise a
// `file://` URL of the written file.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::domain::inference::ArtifactKind;
use crate::domain::repository::{ArtifactStore, PersistenceError, StoredArtifact};

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    dir: PathBuf,
    base_url: Option<String>,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn persist(&self, bytes: &[u8], kind: ArtifactKind) -> Result<StoredArtifact, PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let id = Uuid::new_v4().simple().to_string();
        let file_name = format!("{}.{}", id, kind.extension());
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Wrote {} artifact ({} bytes) to {}", kind.mime_type(), bytes.len(), path.display());

        let url = match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), file_name),
            None => {
                let absolute = std::path::absolute(&path).unwrap_or(path);
                format!("file://{}", absolute.display())
            }
        };

        Ok(StoredArtifact { url, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_file_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("out"), Some("https://cdn.example.com/art/".into()));

        let stored = store.persist(b"<svg/>", ArtifactKind::Svg).await.unwrap();

        assert_eq!(stored.url, format!("https://cdn.example.com/art/{}.svg", stored.id));
        let written = std::fs::read(dir.path().join("out").join(format!("{}.svg", stored.id))).unwrap();
        assert_eq!(written, b"<svg/>");
    }

    #[tokio::test]
    async fn test_file_url_without_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), None);

        let stored = store.persist(b"{}", ArtifactKind::Json).await.unwrap();

        assert!(stored.url.starts_with("file://"));
        assert!(stored.url.ends_with(".json"));
    }
}
