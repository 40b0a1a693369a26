// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Hugging Face Inference API Adapter
//
// POST {base_url}/models/{remote_model}
// The canonical inputs are sent as the JSON body unmodified.
//
// The API answers with raw image bytes, or JSON carrying either a base64
// `image`/`generated_image` field or an `error` message.

use async_trait::async_trait;
use serde_json::Value;

use super::{decode_base64_image, round_trip};
use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact};
use crate::domain::model::{ModelDescriptor, ModelType};
use crate::domain::provider::{ImageProvider, ProviderEndpoint, ProviderKind, ProviderRequest};

pub struct HuggingFaceAdapter {
    client: reqwest::Client,
    endpoint: ProviderEndpoint,
}

impl HuggingFaceAdapter {
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    fn build_request(
        &self,
        _model_type: ModelType,
        remote_model: Option<&str>,
        inputs: &CanonicalInputs,
    ) -> Result<ProviderRequest, InferenceError> {
        let model = remote_model.ok_or_else(|| {
            InferenceError::InvalidDescriptor("Hugging Face models require remote_model".into())
        })?;

        Ok(ProviderRequest {
            path: format!("/models/{}", model),
            body: Value::Object(inputs.as_map().clone()),
        })
    }

    fn parse_response(
        &self,
        _model_type: ModelType,
        raw_body: &[u8],
    ) -> Result<GeneratedArtifact, InferenceError> {
        let json = match serde_json::from_slice::<Value>(raw_body) {
            Ok(value) => value,
            // Not JSON: the body is the image itself
            Err(_) => return Ok(GeneratedArtifact::image(raw_body.to_vec(), None)),
        };

        let object = match &json {
            Value::Array(items) => items.first(),
            other => Some(other),
        };

        if let Some(error) = object.and_then(|o| o.get("error")) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(InferenceError::ProviderError(message));
        }

        let encoded = object
            .and_then(|o| o.get("image").or_else(|| o.get("generated_image")))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                InferenceError::MissingArtifact("response contains no image".into())
            })?;
        let seed = object.and_then(|o| o.get("seed")).and_then(Value::as_i64);

        Ok(GeneratedArtifact::image(decode_base64_image(encoded)?, seed))
    }

    async fn generate(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        round_trip(self, &self.client, descriptor, inputs, &[]).await
    }
}
