// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Image Provider Domain Interface (Anti-Corruption Layer)
//
// Isolates dispatch logic from the three remote API families. Each adapter
// translates canonical inputs into a provider payload and the provider
// response back into a GeneratedArtifact.
//
// Implementations live in infrastructure/providers/.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact};
use crate::domain::model::{ModelDescriptor, ModelType};

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    HuggingFace,
    Stability,
    #[serde(rename = "openai")]
    OpenAI,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Stability => "stability",
            ProviderKind::OpenAI => "openai",
        };
        f.write_str(name)
    }
}

fn default_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

/// Remote API endpoint and its credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Unique endpoint name referenced by `ModelDescriptor::api_endpoint`
    pub name: String,

    pub provider: ProviderKind,

    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ProviderEndpoint {
    /// An endpoint is active iff it has credentials
    pub fn is_active(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// Provider-specific HTTP payload
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Path appended to the endpoint base URL
    pub path: String,
    pub body: Value,
}

/// Domain interface for remote image providers
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn endpoint(&self) -> &ProviderEndpoint;

    /// Translate canonical inputs into the provider payload
    fn build_request(
        &self,
        model_type: ModelType,
        remote_model: Option<&str>,
        inputs: &CanonicalInputs,
    ) -> Result<ProviderRequest, InferenceError>;

    /// Translate a successful (2xx) response body into an artifact
    fn parse_response(
        &self,
        model_type: ModelType,
        raw_body: &[u8],
    ) -> Result<GeneratedArtifact, InferenceError>;

    /// Perform one HTTP round trip for the given model. No retries.
    async fn generate(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError>;
}

/// Resolves the adapter that speaks to a given endpoint
pub trait ProviderFactory: Send + Sync {
    fn adapter(&self, endpoint: &ProviderEndpoint) -> Arc<dyn ImageProvider>;
}
