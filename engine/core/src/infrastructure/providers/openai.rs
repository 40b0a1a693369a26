// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Images API Adapter
//
// POST {base_url}/images/generations with `response_format = b64_json`.
// Also works with OpenAI-compatible image servers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{decode_base64_image, round_trip};
use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact};
use crate::domain::model::{ModelDescriptor, ModelType};
use crate::domain::provider::{ImageProvider, ProviderEndpoint, ProviderKind, ProviderRequest};

pub const DEFAULT_SIZE: &str = "1024x1024";

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: ProviderEndpoint,
}

impl OpenAIAdapter {
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ImageProvider for OpenAIAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    fn build_request(
        &self,
        model_type: ModelType,
        remote_model: Option<&str>,
        inputs: &CanonicalInputs,
    ) -> Result<ProviderRequest, InferenceError> {
        if model_type != ModelType::Text2Img {
            return Err(InferenceError::UnsupportedModelType(model_type));
        }
        let prompt = inputs.require_str("prompt")?;

        let mut body = json!({
            "prompt": prompt,
            "n": 1,
            "size": inputs.get_str("size").unwrap_or(DEFAULT_SIZE),
            "response_format": "b64_json",
        });
        if let Some(model) = remote_model {
            body["model"] = json!(model);
        }

        Ok(ProviderRequest {
            path: "/images/generations".to_string(),
            body,
        })
    }

    fn parse_response(
        &self,
        _model_type: ModelType,
        raw_body: &[u8],
    ) -> Result<GeneratedArtifact, InferenceError> {
        let response: ImagesResponse = serde_json::from_slice(raw_body).map_err(|e| {
            InferenceError::ProviderError(format!("Failed to parse response: {}", e))
        })?;

        let encoded = response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| InferenceError::MissingArtifact("no b64_json image returned".into()))?;

        // The Images API does not expose a seed
        Ok(GeneratedArtifact::image(decode_base64_image(&encoded)?, None))
    }

    async fn generate(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        round_trip(self, &self.client, descriptor, inputs, &[]).await
    }
}
