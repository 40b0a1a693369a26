// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Local Backend Domain Interface
//
// Executes models that have a local `path` instead of an API endpoint. The
// simulated implementation lives in infrastructure/local_backend.rs; a real
// ML runtime can be substituted without touching the dispatcher.

use async_trait::async_trait;

use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact};
use crate::domain::model::ModelDescriptor;

#[async_trait]
pub trait LocalBackend: Send + Sync {
    /// Run a local model. Unsupported model types fail with
    /// `InferenceError::UnsupportedModelType`.
    async fn generate_local(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError>;
}
